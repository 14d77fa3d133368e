//! Line-item totalling and validation for the upstream estimate stages.
//!
//! Line items are strict: a cost without a quantity (or the reverse) rejects
//! the whole submission, while a fully blank item is skipped. Products and
//! totals above [`MAX_AMOUNT`] are rejected.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::common::round_half_up;
use crate::input::MAX_AMOUNT;
use crate::models::{Category, LaborEntry, LaborInput, LineItem, LineItemInput, LowVoltageInput};

/// Errors that block a stage submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageValidationError {
    /// None of the sections of a stage carries data.
    #[error("Please fill out at least one field in either the {} section.", join_labels(.0))]
    NoSectionData(Vec<Category>),

    /// Only one half of a cost/quantity pair was filled in.
    #[error("Please fill out both cost and {quantity_label} for {name}.")]
    IncompleteLineItem {
        category: Category,
        name: String,
        quantity_label: &'static str,
    },

    /// A cost or quantity below zero.
    #[error("{field} for {name} cannot be negative.")]
    NegativeAmount { name: String, field: &'static str },

    /// A labor position with some but not all of its fields.
    #[error("Please fill out all fields for {0} or leave all empty.")]
    IncompleteLaborPosition(String),

    /// No labor position produced a positive subtotal.
    #[error("Please fill out at least one labor position field.")]
    NoLaborData,

    /// Only one of chargers count and charger price was filled in.
    #[error("Please fill out both chargers count and charger price.")]
    IncompleteLowVoltage,

    #[error("Low voltage total cannot be negative. Please check your inputs.")]
    NegativeLowVoltageTotal,

    /// A subtotal or section total beyond [`MAX_AMOUNT`].
    #[error("The amount for {0} is too large.")]
    AmountTooLarge(String),
}

fn join_labels(categories: &[Category]) -> String {
    categories
        .iter()
        .map(Category::label)
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Requires at least one of a stage's sections to carry data, given each
/// section's category and whether it has any.
pub fn require_any_section(sections: &[(Category, bool)]) -> Result<(), StageValidationError> {
    if sections.iter().any(|(_, has_data)| *has_data) {
        return Ok(());
    }
    Err(StageValidationError::NoSectionData(
        sections.iter().map(|(category, _)| *category).collect(),
    ))
}

/// Validated entries of one section and their summed subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTotal<T> {
    pub entries: Vec<T>,
    pub total: Decimal,
}

impl<T> Default for SectionTotal<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: Decimal::ZERO,
        }
    }
}

impl<T> SectionTotal<T> {
    /// Appends an entry, keeping the running total within [`MAX_AMOUNT`].
    fn push(
        &mut self,
        entry: T,
        subtotal: Decimal,
        name: &str,
    ) -> Result<(), StageValidationError> {
        self.total = within_limit(self.total.checked_add(subtotal), name)?;
        self.entries.push(entry);
        Ok(())
    }
}

fn within_limit(
    value: Option<Decimal>,
    name: &str,
) -> Result<Decimal, StageValidationError> {
    value
        .filter(|value| value.abs() <= MAX_AMOUNT)
        .ok_or_else(|| StageValidationError::AmountTooLarge(name.to_string()))
}

/// Name of the quantity column for a material section.
pub fn quantity_label(category: Category) -> &'static str {
    match category {
        Category::Awg | Category::Conduit => "length",
        _ => "quantity",
    }
}

/// True when any line item of the section has at least one populated field.
pub fn section_has_data(items: &[LineItemInput]) -> bool {
    items.iter().any(|item| !item.is_blank())
}

/// Computes a single line item's subtotal.
///
/// Returns `Ok(None)` for a blank item, which contributes nothing.
pub fn line_subtotal(
    category: Category,
    item: &LineItemInput,
) -> Result<Option<LineItem>, StageValidationError> {
    let (cost, quantity) = match (item.cost, item.quantity) {
        (None, None) => return Ok(None),
        (Some(cost), Some(quantity)) => (cost, quantity),
        _ => {
            return Err(StageValidationError::IncompleteLineItem {
                category,
                name: item.name.clone(),
                quantity_label: quantity_label(category),
            });
        }
    };

    if cost < Decimal::ZERO {
        return Err(StageValidationError::NegativeAmount {
            name: item.name.clone(),
            field: "Cost",
        });
    }
    if quantity < Decimal::ZERO {
        return Err(StageValidationError::NegativeAmount {
            name: item.name.clone(),
            field: "Quantity",
        });
    }

    Ok(Some(LineItem {
        name: item.name.clone(),
        cost,
        quantity,
        subtotal: within_limit(cost.checked_mul(quantity), &item.name)?,
    }))
}

/// Totals a material section.
///
/// Every populated item is validated; the first incomplete pair rejects the
/// section even if other items are complete.
pub fn total_line_items(
    category: Category,
    items: &[LineItemInput],
) -> Result<SectionTotal<LineItem>, StageValidationError> {
    let mut section = SectionTotal::default();

    for item in items {
        if let Some(entry) = line_subtotal(category, item)? {
            let subtotal = entry.subtotal;
            section.push(entry, subtotal, category.label())?;
        }
    }

    section.total = round_half_up(section.total);
    Ok(section)
}

/// Totals the labor positions: `rate × workers × hours × days` per position.
///
/// Each position must be either fully filled in or fully blank. Positions whose
/// subtotal is zero are kept but do not count as labor data.
pub fn total_labor(
    items: &[LaborInput]
) -> Result<(SectionTotal<LaborEntry>, bool), StageValidationError> {
    let mut section = SectionTotal::default();
    let mut has_data = false;

    for item in items {
        if item.is_blank() {
            continue;
        }
        let (Some(rate), Some(workers), Some(hours), Some(days)) =
            (item.rate, item.workers, item.hours, item.days)
        else {
            return Err(StageValidationError::IncompleteLaborPosition(
                item.position.clone(),
            ));
        };

        for (value, field) in [(rate, "Rate"), (hours, "Hours"), (days, "Days")] {
            if value < Decimal::ZERO {
                return Err(StageValidationError::NegativeAmount {
                    name: item.position.clone(),
                    field,
                });
            }
        }

        let subtotal = within_limit(
            [Decimal::from(workers), hours, days]
                .into_iter()
                .try_fold(rate, |acc, factor| acc.checked_mul(factor)),
            &item.position,
        )?;
        if subtotal > Decimal::ZERO {
            has_data = true;
        }
        let entry = LaborEntry {
            position: item.position.clone(),
            rate,
            workers,
            hours,
            days,
            subtotal,
        };
        section.push(entry, subtotal, Category::Labor.label())?;
    }

    section.total = round_half_up(section.total);
    Ok((section, has_data))
}

/// Totals the low-voltage section: `chargers_count × charger_price`.
///
/// The section is optional: both fields blank reads as no chargers at no cost.
/// Returns `(chargers_count, charger_price, total)`.
pub fn total_low_voltage(
    input: &LowVoltageInput
) -> Result<(u32, Decimal, Decimal), StageValidationError> {
    let (count, price) = match (input.chargers_count, input.charger_price) {
        (None, None) => return Ok((0, Decimal::ZERO, Decimal::ZERO)),
        (Some(count), Some(price)) => (count, price),
        _ => return Err(StageValidationError::IncompleteLowVoltage),
    };

    let total = round_half_up(within_limit(
        Decimal::from(count).checked_mul(price),
        Category::LowVoltage.label(),
    )?);
    if total < Decimal::ZERO {
        return Err(StageValidationError::NegativeLowVoltageTotal);
    }
    Ok((count, price, total))
}
