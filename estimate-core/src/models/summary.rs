use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;

/// One category row of the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLine {
    pub base_cost: Decimal,
    pub markup: Decimal,
    pub subtotal: Decimal,
    pub profit: Decimal,
}

/// The income-tax or overhead row: a percentage of an aggregate base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageLine {
    pub base_cost: Decimal,
    pub percentage: Decimal,
    pub subtotal: Decimal,
}

/// A saved summary for a project.
///
/// `grand_total` includes every category; `price_per_unit` is derived from the
/// reduced grand total that leaves low voltage out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: i64,
    pub categories: BTreeMap<Category, CategoryLine>,
    pub tax: PercentageLine,
    pub overhead: PercentageLine,
    pub grand_subtotal: Decimal,
    pub grand_total: Decimal,
    pub price_per_unit: Decimal,
    pub price_per_unit_submitted: Decimal,
    pub approved: Option<bool>,
    pub total_submitted: Decimal,
    pub approved_amount: Decimal,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectSummary {
    pub fn line(
        &self,
        category: Category,
    ) -> CategoryLine {
        self.categories.get(&category).copied().unwrap_or_default()
    }
}
