//! Imports the fixture files and evaluates the resulting stage forms.

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use estimate_core::Category;
use estimate_core::calculations::{LaborForm, MiscEquipmentForm, WireConduitForm};
use estimate_data::{LaborLoader, LineItemLoader, LoaderError};

const WIRE_CONDUIT_CSV: &str = include_str!("../test-data/wire_conduit.csv");
const MISC_EQUIPMENT_CSV: &str = include_str!("../test-data/misc_equipment.csv");
const LABOR_CSV: &str = include_str!("../test-data/labor.csv");

#[test]
fn test_wire_conduit_fixture_evaluates() {
    let [awg, conduit] =
        LineItemLoader::load(WIRE_CONDUIT_CSV.as_bytes(), [Category::Awg, Category::Conduit])
            .expect("Failed to load wire & conduit fixture");
    assert_eq!(awg.len(), 3);
    assert_eq!(conduit.len(), 2);

    let form = WireConduitForm {
        awg,
        conduit,
        ..WireConduitForm::default()
    };
    let estimate = form.evaluate(1).expect("Fixture should be valid");

    assert_eq!(estimate.awg_entries.len(), 2);
    assert_eq!(estimate.awg_total, dec!(3520.00));
    assert_eq!(estimate.conduit_total, dec!(500.00));
    assert_eq!(estimate.grand_total, dec!(4020.00));
}

#[test]
fn test_misc_equipment_fixture_evaluates_with_sales_tax() {
    let [misc, equipment] = LineItemLoader::load(
        MISC_EQUIPMENT_CSV.as_bytes(),
        [Category::Misc, Category::Equipment],
    )
    .expect("Failed to load misc & equipment fixture");

    let form = MiscEquipmentForm {
        misc,
        equipment,
        sales_tax_percentage: "10".to_string(),
        ..MiscEquipmentForm::default()
    };
    let estimate = form.evaluate(1).expect("Fixture should be valid");

    assert_eq!(estimate.misc_total, dec!(200.00));
    assert_eq!(estimate.equipment_total, dec!(2400.00));
    assert_eq!(estimate.sales_tax_amount, dec!(260.00));
    assert_eq!(estimate.grand_total, dec!(2860.00));
}

#[test]
fn test_wire_fixture_rejected_on_misc_form() {
    let result = LineItemLoader::load(
        WIRE_CONDUIT_CSV.as_bytes(),
        [Category::Misc, Category::Equipment],
    );

    assert!(matches!(
        result,
        Err(LoaderError::UnexpectedSection { .. })
    ));
}

#[test]
fn test_labor_fixture_evaluates() {
    let positions = LaborLoader::load(LABOR_CSV.as_bytes()).expect("Failed to load labor fixture");
    assert_eq!(positions.len(), 3);

    let form = LaborForm {
        positions,
        low_voltage: estimate_core::LowVoltageInput {
            chargers_count: Some(4),
            charger_price: Some(dec!(250)),
        },
    };
    let estimate = form.evaluate(1).expect("Fixture should be valid");

    assert_eq!(estimate.labor_entries.len(), 2);
    assert_eq!(estimate.labor_total, dec!(4880.00));
    assert_eq!(estimate.grand_total, dec!(5880.00));
}
