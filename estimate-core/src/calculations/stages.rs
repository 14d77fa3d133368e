//! The three upstream stage forms and their evaluation into stage records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::percentage_of;
use super::totalizer::{
    StageValidationError, require_any_section, section_has_data, total_labor, total_line_items,
    total_low_voltage,
};
use crate::input::parse_rate;
use crate::models::{
    Category, LaborEstimate, LaborInput, LineItemInput, LowVoltageInput, MiscEquipmentEstimate,
    WireConduitEstimate,
};

/// Wire & conduit form: AWG and conduit priced per foot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConduitForm {
    pub awg: Vec<LineItemInput>,
    pub conduit: Vec<LineItemInput>,
    /// Sales tax percentage as typed; blank means no sales tax.
    pub sales_tax_percentage: String,
    pub notes_awg: String,
    pub notes_conduit: String,
}

impl WireConduitForm {
    /// Validates the form and computes the stage totals.
    ///
    /// Sales tax is charged once on the combined AWG and conduit total.
    ///
    /// # Errors
    ///
    /// Returns [`StageValidationError`] if both sections are empty or any line
    /// item has only one of cost and length.
    pub fn evaluate(
        &self,
        project_id: i64,
    ) -> Result<WireConduitEstimate, StageValidationError> {
        require_any_section(&[
            (Category::Awg, section_has_data(&self.awg)),
            (Category::Conduit, section_has_data(&self.conduit)),
        ])?;

        let awg = total_line_items(Category::Awg, &self.awg)?;
        let conduit = total_line_items(Category::Conduit, &self.conduit)?;

        let sales_tax_percentage = parse_rate(&self.sales_tax_percentage, Decimal::ZERO);
        let sales_tax_amount = percentage_of(awg.total + conduit.total, sales_tax_percentage);

        Ok(WireConduitEstimate {
            project_id,
            grand_total: awg.total + conduit.total + sales_tax_amount,
            awg_total: awg.total,
            conduit_total: conduit.total,
            awg_entries: awg.entries,
            conduit_entries: conduit.entries,
            sales_tax_percentage,
            sales_tax_amount,
            notes_awg: self.notes_awg.trim().to_string(),
            notes_conduit: self.notes_conduit.trim().to_string(),
        })
    }
}

/// Miscellaneous & equipment form, priced per unit quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscEquipmentForm {
    pub misc: Vec<LineItemInput>,
    pub equipment: Vec<LineItemInput>,
    pub sales_tax_percentage: String,
    pub notes_misc: String,
    pub notes_equipment: String,
}

impl MiscEquipmentForm {
    /// Validates the form and computes the stage totals.
    ///
    /// Sales tax is charged per section, each rounded to the cent.
    pub fn evaluate(
        &self,
        project_id: i64,
    ) -> Result<MiscEquipmentEstimate, StageValidationError> {
        require_any_section(&[
            (Category::Misc, section_has_data(&self.misc)),
            (Category::Equipment, section_has_data(&self.equipment)),
        ])?;

        let misc = total_line_items(Category::Misc, &self.misc)?;
        let equipment = total_line_items(Category::Equipment, &self.equipment)?;

        let sales_tax_percentage = parse_rate(&self.sales_tax_percentage, Decimal::ZERO);
        let misc_tax = percentage_of(misc.total, sales_tax_percentage);
        let equipment_tax = percentage_of(equipment.total, sales_tax_percentage);
        let misc_grand_total = misc.total + misc_tax;
        let equipment_grand_total = equipment.total + equipment_tax;

        Ok(MiscEquipmentEstimate {
            project_id,
            misc_total: misc.total,
            equipment_total: equipment.total,
            misc_entries: misc.entries,
            equipment_entries: equipment.entries,
            sales_tax_percentage,
            sales_tax_amount: misc_tax + equipment_tax,
            misc_grand_total,
            equipment_grand_total,
            grand_total: misc_grand_total + equipment_grand_total,
            notes_misc: self.notes_misc.trim().to_string(),
            notes_equipment: self.notes_equipment.trim().to_string(),
        })
    }
}

/// Labor form: crew positions plus the low-voltage charger supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborForm {
    pub positions: Vec<LaborInput>,
    pub low_voltage: LowVoltageInput,
}

impl LaborForm {
    /// Validates the form and computes the labor and low-voltage totals.
    ///
    /// The low-voltage section may be left blank, which supplies no chargers.
    ///
    /// # Errors
    ///
    /// Returns [`StageValidationError`] if a position is partly filled, no
    /// position has a positive subtotal, or the low-voltage section is only
    /// half filled or negative.
    pub fn evaluate(
        &self,
        project_id: i64,
    ) -> Result<LaborEstimate, StageValidationError> {
        let (labor, has_labor) = total_labor(&self.positions)?;
        if !has_labor {
            return Err(StageValidationError::NoLaborData);
        }

        let (chargers_count, charger_price, low_voltage_total) =
            total_low_voltage(&self.low_voltage)?;

        Ok(LaborEstimate {
            project_id,
            grand_total: labor.total + low_voltage_total,
            labor_total: labor.total,
            labor_entries: labor.entries,
            chargers_count,
            charger_price,
            low_voltage_total,
        })
    }
}
