//! Summary-stage pricing: markups, profit, income tax, overhead and the
//! per-unit quote.
//!
//! The pipeline is a pure function of an [`EstimateSnapshot`]:
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | `subtotal(c) = base_cost(c) × markup(c)` for every category |
//! | 2    | `profit(c) = subtotal(c) − base_cost(c)` |
//! | 3    | income tax = Σ profit over the tax base × tax% |
//! | 4    | overhead = Σ subtotal over the overhead base × overhead% |
//! | 5    | grand total = Σ subtotal + income tax + overhead |
//! | 6    | reduced grand total = same, without the excluded categories |
//! | 7    | price per unit = reduced grand total ÷ unit count |
//! | 8    | submitted price per unit = (submitted total − excluded base costs) ÷ unit count |
//!
//! Income tax and overhead both add margin on top of the category subtotals,
//! so the quote carries markup profit twice. Both figures are kept as the
//! quote has always shown them.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use estimate_core::calculations::PricingCalculator;
//! use estimate_core::{Category, EstimateSnapshot, SummaryField};
//!
//! let snapshot = EstimateSnapshot::default()
//!     .with_edit(SummaryField::BaseCost(Category::Awg), "1000")
//!     .with_edit(SummaryField::BaseCost(Category::Labor), "800")
//!     .with_edit(SummaryField::UnitCount, "2");
//!
//! let result = PricingCalculator::default().calculate(&snapshot);
//!
//! // No markup, so no profit and no income tax; overhead is 8.5% of 1800.
//! assert_eq!(result.overhead.subtotal, dec!(153.00));
//! assert_eq!(result.price_per_unit, dec!(976.50));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::common::{per_unit, percentage_of, round_half_up};
use crate::input::{MAX_RATE, parse_amount, parse_rate};
use crate::models::{Category, CategoryLine, EstimateSnapshot, PercentageLine, ProjectSummary};

/// Errors raised by an invalid [`PricingConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingConfigError {
    /// The default markup must be positive and at most [`MAX_RATE`].
    #[error("default markup must be positive and at most 10000, got {0}")]
    InvalidDefaultMarkup(Decimal),

    /// A default percentage must be between 0 and 100.
    #[error("default {name} percentage must be between 0 and 100, got {value}")]
    InvalidDefaultPercentage { name: &'static str, value: Decimal },
}

/// Defaults and category sets that shape the pricing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Markup used when a category's markup is blank, invalid or zero.
    pub default_markup: Decimal,

    /// Income-tax percentage used when none is entered.
    pub default_tax_percentage: Decimal,

    /// Overhead percentage used when none is entered.
    pub default_overhead_percentage: Decimal,

    /// Categories whose profits are summed into the income-tax base.
    pub tax_base: BTreeSet<Category>,

    /// Categories whose subtotals are summed into the overhead base.
    pub overhead_base: BTreeSet<Category>,

    /// Categories left out of the reduced grand total. Their base costs are
    /// also deducted from the submitted total before it is split per unit.
    pub reduced_exclusions: BTreeSet<Category>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_markup: dec!(1.0),
            default_tax_percentage: dec!(30),
            default_overhead_percentage: dec!(8.5),
            tax_base: Category::ALL.into_iter().collect(),
            overhead_base: Category::ALL.into_iter().collect(),
            reduced_exclusions: BTreeSet::from([Category::LowVoltage]),
        }
    }
}

impl PricingConfig {
    /// Validates the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PricingConfigError`] if the default markup is not in
    /// `(0, MAX_RATE]` or a default percentage is outside `[0, 100]`.
    pub fn validate(&self) -> Result<(), PricingConfigError> {
        if self.default_markup <= Decimal::ZERO || self.default_markup > MAX_RATE {
            return Err(PricingConfigError::InvalidDefaultMarkup(
                self.default_markup,
            ));
        }
        for (name, value) in [
            ("tax", self.default_tax_percentage),
            ("overhead", self.default_overhead_percentage),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                return Err(PricingConfigError::InvalidDefaultPercentage { name, value });
            }
        }
        Ok(())
    }
}

/// Output of one pricing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub categories: BTreeMap<Category, CategoryLine>,

    /// Income tax on the summed profits.
    pub tax: PercentageLine,

    /// Overhead margin on the summed subtotals.
    pub overhead: PercentageLine,

    /// Σ category subtotals, before tax and overhead.
    pub grand_subtotal: Decimal,

    /// Every category plus tax and overhead.
    pub grand_total: Decimal,

    /// Grand total without the excluded categories; the basis of the quote.
    pub grand_total_reduced: Decimal,

    pub price_per_unit: Decimal,

    /// Per-unit price derived from the submitted total only.
    pub price_per_unit_submitted: Decimal,
}

impl PricingResult {
    pub fn line(
        &self,
        category: Category,
    ) -> CategoryLine {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// Builds the summary record saved for the snapshot's project.
    pub fn into_summary(
        self,
        snapshot: &EstimateSnapshot,
    ) -> ProjectSummary {
        ProjectSummary {
            project_id: snapshot.project_id,
            categories: self.categories,
            tax: self.tax,
            overhead: self.overhead,
            grand_subtotal: self.grand_subtotal,
            grand_total: self.grand_total,
            price_per_unit: self.price_per_unit,
            price_per_unit_submitted: self.price_per_unit_submitted,
            approved: snapshot.approved,
            total_submitted: parse_amount(&snapshot.total_submitted),
            approved_amount: parse_amount(&snapshot.approved_amount),
            notes: snapshot.notes.clone(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Per-unit price from a submitted total.
///
/// The base costs of categories excluded from the quote are deducted first.
/// Zero when the unit count or the submitted total is not positive.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::price_per_unit_submitted;
///
/// assert_eq!(price_per_unit_submitted(dec!(5000), dec!(1000), 4), dec!(1000.00));
/// assert_eq!(price_per_unit_submitted(dec!(0), dec!(1000), 4), dec!(0));
/// ```
pub fn price_per_unit_submitted(
    total_submitted: Decimal,
    excluded_base_cost: Decimal,
    unit_count: u32,
) -> Decimal {
    if unit_count == 0 || total_submitted <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    per_unit(total_submitted - excluded_base_cost, unit_count)
}

/// Calculator for the summary stage.
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Runs the whole pipeline over `snapshot`.
    ///
    /// Nothing is cached between calls; the same snapshot always yields the
    /// same result.
    pub fn calculate(
        &self,
        snapshot: &EstimateSnapshot,
    ) -> PricingResult {
        let categories: BTreeMap<Category, CategoryLine> = Category::ALL
            .into_iter()
            .map(|category| (category, self.category_line(snapshot, category)))
            .collect();

        let tax = self.income_tax(snapshot, &categories);
        let overhead = self.overhead(snapshot, &categories);

        let grand_subtotal: Decimal = categories.values().map(|line| line.subtotal).sum();
        let grand_total = grand_subtotal + tax.subtotal + overhead.subtotal;

        let reduced_subtotal: Decimal = categories
            .iter()
            .filter(|(category, _)| !self.config.reduced_exclusions.contains(category))
            .map(|(_, line)| line.subtotal)
            .sum();
        let grand_total_reduced = reduced_subtotal + tax.subtotal + overhead.subtotal;

        let price_per_unit = per_unit(grand_total_reduced, snapshot.unit_count);

        let excluded_base_cost: Decimal = self
            .config
            .reduced_exclusions
            .iter()
            .map(|category| snapshot.base_cost(*category))
            .sum();
        let price_per_unit_submitted = price_per_unit_submitted(
            parse_amount(&snapshot.total_submitted),
            excluded_base_cost,
            snapshot.unit_count,
        );

        debug!(
            project_id = snapshot.project_id,
            grand_total = %grand_total,
            grand_total_reduced = %grand_total_reduced,
            unit_count = snapshot.unit_count,
            "Priced estimate"
        );

        PricingResult {
            categories,
            tax,
            overhead,
            grand_subtotal,
            grand_total,
            grand_total_reduced,
            price_per_unit,
            price_per_unit_submitted,
        }
    }

    /// Steps 1 and 2: marked-up subtotal and profit for one category.
    fn category_line(
        &self,
        snapshot: &EstimateSnapshot,
        category: Category,
    ) -> CategoryLine {
        let base_cost = snapshot.base_cost(category);
        let markup = parse_rate(snapshot.markup_text(category), self.config.default_markup);
        let subtotal = round_half_up(base_cost * markup);

        CategoryLine {
            base_cost,
            markup,
            subtotal,
            profit: subtotal - base_cost,
        }
    }

    /// Step 3: income tax on the summed profits of the tax base.
    fn income_tax(
        &self,
        snapshot: &EstimateSnapshot,
        categories: &BTreeMap<Category, CategoryLine>,
    ) -> PercentageLine {
        let base_cost: Decimal = self
            .config
            .tax_base
            .iter()
            .filter_map(|category| categories.get(category))
            .map(|line| line.profit)
            .sum();
        let percentage = parse_rate(&snapshot.tax_percentage, self.config.default_tax_percentage);

        PercentageLine {
            base_cost,
            percentage,
            subtotal: percentage_of(base_cost, percentage),
        }
    }

    /// Step 4: overhead margin on the summed subtotals of the overhead base.
    fn overhead(
        &self,
        snapshot: &EstimateSnapshot,
        categories: &BTreeMap<Category, CategoryLine>,
    ) -> PercentageLine {
        let base_cost: Decimal = self
            .config
            .overhead_base
            .iter()
            .filter_map(|category| categories.get(category))
            .map(|line| line.subtotal)
            .sum();
        let percentage = parse_rate(
            &snapshot.overhead_percentage,
            self.config.default_overhead_percentage,
        );

        PercentageLine {
            base_cost,
            percentage,
            subtotal: percentage_of(base_cost, percentage),
        }
    }
}
