use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line_item::{LaborEntry, LineItem};
use crate::input::{MAX_AMOUNT, MAX_RATE};

/// Result of the wire & conduit stage, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConduitEstimate {
    pub project_id: i64,
    pub awg_entries: Vec<LineItem>,
    pub conduit_entries: Vec<LineItem>,
    pub sales_tax_percentage: Decimal,
    pub sales_tax_amount: Decimal,
    pub awg_total: Decimal,
    pub conduit_total: Decimal,
    pub grand_total: Decimal,
    pub notes_awg: String,
    pub notes_conduit: String,
}

/// Result of the miscellaneous & equipment stage.
///
/// Sales tax is applied per section, so each section carries its own taxed
/// total alongside the untaxed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscEquipmentEstimate {
    pub project_id: i64,
    pub misc_entries: Vec<LineItem>,
    pub equipment_entries: Vec<LineItem>,
    pub sales_tax_percentage: Decimal,
    pub sales_tax_amount: Decimal,
    pub misc_total: Decimal,
    pub equipment_total: Decimal,
    pub misc_grand_total: Decimal,
    pub equipment_grand_total: Decimal,
    pub grand_total: Decimal,
    pub notes_misc: String,
    pub notes_equipment: String,
}

/// Result of the labor stage, including the low-voltage charger supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborEstimate {
    pub project_id: i64,
    pub labor_entries: Vec<LaborEntry>,
    pub chargers_count: u32,
    pub charger_price: Decimal,
    pub labor_total: Decimal,
    pub low_voltage_total: Decimal,
    pub grand_total: Decimal,
}

/// Stored stage totals read back by the summary stage.
///
/// `tax_percentage` is the sales tax entered on the wire & conduit stage and
/// `misc_tax_percentage` the one entered on the misc & equipment stage. The
/// approval fields come from a previously saved summary and are `None` until
/// one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationData {
    pub awg_total: Decimal,
    pub conduit_total: Decimal,
    pub misc_total: Decimal,
    pub equipment_total: Decimal,
    pub labor_total: Decimal,
    pub low_voltage_total: Decimal,
    pub chargers_count: u32,
    pub approved: Option<bool>,
    pub total_submitted: Option<Decimal>,
    pub approved_amount: Option<Decimal>,
    pub tax_percentage: Decimal,
    pub misc_tax_percentage: Decimal,
}

impl EstimationData {
    /// Whether every total is within [`MAX_AMOUNT`] and both sales tax rates
    /// within [`MAX_RATE`].
    pub fn within_limits(&self) -> bool {
        let totals = [
            self.awg_total,
            self.conduit_total,
            self.misc_total,
            self.equipment_total,
            self.labor_total,
            self.low_voltage_total,
        ];
        totals.iter().all(|total| total.abs() <= MAX_AMOUNT)
            && [self.tax_percentage, self.misc_tax_percentage]
                .iter()
                .all(|rate| rate.abs() <= MAX_RATE)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn within_limits_accepts_ordinary_totals() {
        let data = EstimationData {
            awg_total: dec!(3520),
            labor_total: MAX_AMOUNT,
            tax_percentage: dec!(8.25),
            ..EstimationData::default()
        };

        assert!(data.within_limits());
    }

    #[test]
    fn within_limits_rejects_oversized_total_or_rate() {
        let total = EstimationData {
            equipment_total: dec!(1000000000000000000000000000),
            ..EstimationData::default()
        };
        let rate = EstimationData {
            misc_tax_percentage: dec!(-20000),
            ..EstimationData::default()
        };

        assert!(!total.within_limits());
        assert!(!rate.within_limits());
    }
}
