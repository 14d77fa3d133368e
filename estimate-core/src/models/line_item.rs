use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line item as entered on a material stage.
///
/// `None` means the field was left blank. Pairing rules are enforced by the
/// totalizer, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub name: String,
    pub cost: Option<Decimal>,
    pub quantity: Option<Decimal>,
}

impl LineItemInput {
    pub fn new(
        name: impl Into<String>,
        cost: Option<Decimal>,
        quantity: Option<Decimal>,
    ) -> Self {
        Self {
            name: name.into(),
            cost,
            quantity,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cost.is_none() && self.quantity.is_none()
    }
}

/// A validated line item with its computed subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub cost: Decimal,
    pub quantity: Decimal,
    pub subtotal: Decimal,
}

/// A labor position as entered on the labor stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborInput {
    pub position: String,
    pub rate: Option<Decimal>,
    pub workers: Option<u32>,
    pub hours: Option<Decimal>,
    pub days: Option<Decimal>,
}

impl LaborInput {
    pub fn is_blank(&self) -> bool {
        self.rate.is_none() && self.workers.is_none() && self.hours.is_none() && self.days.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.rate.is_some() && self.workers.is_some() && self.hours.is_some() && self.days.is_some()
    }
}

/// A validated labor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborEntry {
    pub position: String,
    pub rate: Decimal,
    pub workers: u32,
    pub hours: Decimal,
    pub days: Decimal,
    pub subtotal: Decimal,
}

/// The low-voltage section of the labor stage: chargers supplied at a unit price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowVoltageInput {
    pub chargers_count: Option<u32>,
    pub charger_price: Option<Decimal>,
}
