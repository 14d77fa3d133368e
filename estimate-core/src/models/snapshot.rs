use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::estimate::EstimationData;
use crate::calculations::common::add_percentage;
use crate::input::{parse_amount, parse_count};

/// An editable field of the summary form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    BaseCost(Category),
    Markup(Category),
    TaxPercentage,
    OverheadPercentage,
    UnitCount,
    TotalSubmitted,
    Approved,
    ApprovedAmount,
    Notes,
}

/// The full input state of the summary form.
///
/// Rate fields keep the text the user typed; the pricing calculator decides
/// how blank or invalid text resolves. Every edit produces a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateSnapshot {
    pub project_id: i64,
    pub base_costs: BTreeMap<Category, Decimal>,
    pub markups: BTreeMap<Category, String>,
    pub tax_percentage: String,
    pub overhead_percentage: String,
    pub unit_count: u32,
    pub total_submitted: String,
    pub approved: Option<bool>,
    pub approved_amount: String,
    pub notes: String,
}

impl EstimateSnapshot {
    /// Seeds a snapshot from the stored stage totals.
    ///
    /// Material totals are stored before sales tax, so each stage's own sales
    /// tax is added back here. Labor and low voltage enter as stored; permits
    /// start at zero.
    pub fn from_estimation_data(
        project_id: i64,
        data: &EstimationData,
    ) -> Self {
        let wire = |total: Decimal| add_percentage(total, data.tax_percentage);
        let misc = |total: Decimal| add_percentage(total, data.misc_tax_percentage);

        let base_costs = BTreeMap::from([
            (Category::Awg, wire(data.awg_total)),
            (Category::Conduit, wire(data.conduit_total)),
            (Category::Misc, misc(data.misc_total)),
            (Category::Equipment, misc(data.equipment_total)),
            (Category::Labor, data.labor_total),
            (Category::LowVoltage, data.low_voltage_total),
            (Category::Permits, Decimal::ZERO),
        ]);

        Self {
            project_id,
            base_costs,
            unit_count: data.chargers_count,
            total_submitted: data
                .total_submitted
                .map(|v| v.to_string())
                .unwrap_or_default(),
            approved: data.approved,
            approved_amount: data
                .approved_amount
                .map(|v| v.to_string())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn base_cost(
        &self,
        category: Category,
    ) -> Decimal {
        self.base_costs
            .get(&category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn markup_text(
        &self,
        category: Category,
    ) -> &str {
        self.markups.get(&category).map_or("", String::as_str)
    }

    /// Returns a copy of the snapshot with one field replaced by `text`.
    ///
    /// Base costs and the unit count are parsed leniently (invalid text is
    /// zero); all other fields keep the raw text.
    pub fn with_edit(
        &self,
        field: SummaryField,
        text: &str,
    ) -> Self {
        let mut next = self.clone();
        match field {
            SummaryField::BaseCost(category) => {
                next.base_costs.insert(category, parse_amount(text));
            }
            SummaryField::Markup(category) => {
                next.markups.insert(category, text.to_string());
            }
            SummaryField::TaxPercentage => next.tax_percentage = text.to_string(),
            SummaryField::OverheadPercentage => next.overhead_percentage = text.to_string(),
            SummaryField::UnitCount => next.unit_count = parse_count(text).unwrap_or(0),
            SummaryField::TotalSubmitted => next.total_submitted = text.to_string(),
            SummaryField::Approved => next.approved = parse_approval(text),
            SummaryField::ApprovedAmount => next.approved_amount = text.to_string(),
            SummaryField::Notes => next.notes = text.to_string(),
        }
        next
    }
}

fn parse_approval(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "approved" => Some(true),
        "false" | "no" | "rejected" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn stored() -> EstimationData {
        EstimationData {
            awg_total: dec!(1000),
            conduit_total: dec!(500),
            misc_total: dec!(200),
            equipment_total: dec!(300),
            labor_total: dec!(800),
            low_voltage_total: dec!(1000),
            chargers_count: 4,
            approved: None,
            total_submitted: Some(dec!(5000)),
            approved_amount: None,
            tax_percentage: dec!(10),
            misc_tax_percentage: dec!(10),
        }
    }

    #[test]
    fn from_estimation_data_folds_sales_tax_into_materials() {
        let snapshot = EstimateSnapshot::from_estimation_data(7, &stored());

        assert_eq!(snapshot.base_cost(Category::Awg), dec!(1100.00));
        assert_eq!(snapshot.base_cost(Category::Conduit), dec!(550.00));
        assert_eq!(snapshot.base_cost(Category::Misc), dec!(220.00));
        assert_eq!(snapshot.base_cost(Category::Equipment), dec!(330.00));
        assert_eq!(snapshot.base_cost(Category::Labor), dec!(800));
        assert_eq!(snapshot.base_cost(Category::LowVoltage), dec!(1000));
        assert_eq!(snapshot.base_cost(Category::Permits), dec!(0));
        assert_eq!(snapshot.unit_count, 4);
        assert_eq!(snapshot.total_submitted, "5000");
        assert_eq!(snapshot.approved_amount, "");
    }

    #[test]
    fn from_estimation_data_uses_each_stage_sales_tax() {
        let data = EstimationData {
            tax_percentage: dec!(0),
            misc_tax_percentage: dec!(7.25),
            ..stored()
        };

        let snapshot = EstimateSnapshot::from_estimation_data(7, &data);

        assert_eq!(snapshot.base_cost(Category::Awg), dec!(1000));
        assert_eq!(snapshot.base_cost(Category::Conduit), dec!(500));
        assert_eq!(snapshot.base_cost(Category::Misc), dec!(214.50));
        assert_eq!(snapshot.base_cost(Category::Equipment), dec!(321.75));
    }

    #[test]
    fn with_edit_leaves_source_untouched() {
        let snapshot = EstimateSnapshot::from_estimation_data(7, &stored());

        let edited = snapshot.with_edit(SummaryField::Markup(Category::Labor), "1.5");

        assert_eq!(edited.markup_text(Category::Labor), "1.5");
        assert_eq!(snapshot.markup_text(Category::Labor), "");
    }

    #[test]
    fn with_edit_parses_base_cost_and_unit_count() {
        let snapshot = EstimateSnapshot::default()
            .with_edit(SummaryField::BaseCost(Category::Permits), "$1,250")
            .with_edit(SummaryField::UnitCount, "abc");

        assert_eq!(snapshot.base_cost(Category::Permits), dec!(1250));
        assert_eq!(snapshot.unit_count, 0);
    }

    #[test]
    fn with_edit_approval_text() {
        let snapshot = EstimateSnapshot::default();

        assert_eq!(snapshot.with_edit(SummaryField::Approved, "Yes").approved, Some(true));
        assert_eq!(snapshot.with_edit(SummaryField::Approved, "no").approved, Some(false));
        assert_eq!(snapshot.with_edit(SummaryField::Approved, "").approved, None);
    }
}
