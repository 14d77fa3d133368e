//! Estimate calculations.
//!
//! The upstream stages total their line items through the [`totalizer`]; the
//! summary stage prices the stored totals with the [`PricingCalculator`].

pub mod common;
pub mod pricing;
pub mod stages;
pub mod totalizer;

pub use pricing::{
    PricingCalculator, PricingConfig, PricingConfigError, PricingResult, price_per_unit_submitted,
};
pub use stages::{LaborForm, MiscEquipmentForm, WireConduitForm};
pub use totalizer::{SectionTotal, StageValidationError, require_any_section};
