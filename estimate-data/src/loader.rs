use std::io::Read;

use estimate_core::input::parse_optional_amount;
use estimate_core::{Category, LaborInput, LineItemInput};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when importing stage line items.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    /// A real category that belongs to another stage.
    #[error("Section '{section}' does not belong on this form (expected {expected})")]
    UnexpectedSection { section: String, expected: String },
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

/// Blank cells are `None`; anything else must read as an amount.
fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_optional_amount(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount '{}'", s.trim()))),
        None => Ok(None),
    }
}

/// One row of a line-item CSV file.
///
/// - `section`: category key (`awg`, `conduit`, `misc`, `equipment`)
/// - `name`: item description
/// - `cost`: unit cost, or cost per foot for wire and conduit
/// - `quantity`: count, or length in feet
///
/// Cost and quantity may be blank; pairing is checked when the stage is
/// evaluated, not here.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LineItemRecord {
    pub section: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub cost: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub quantity: Option<Decimal>,
}

/// Reader for line-item CSV files.
pub struct LineItemLoader;

impl LineItemLoader {
    /// Parses every row of `reader`.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<LineItemRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: LineItemRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Splits records into the two sections of one stage form, keeping file
    /// order within each section.
    ///
    /// # Errors
    ///
    /// * [`LoaderError::UnknownSection`] if a section is not a category key.
    /// * [`LoaderError::UnexpectedSection`] if it names a category outside
    ///   `sections`.
    pub fn split(
        records: Vec<LineItemRecord>,
        sections: [Category; 2],
    ) -> Result<[Vec<LineItemInput>; 2], LoaderError> {
        let mut split: [Vec<LineItemInput>; 2] = [Vec::new(), Vec::new()];

        for record in records {
            let category = Category::parse(&record.section)
                .ok_or_else(|| LoaderError::UnknownSection(record.section.clone()))?;
            let index = sections
                .iter()
                .position(|section| *section == category)
                .ok_or_else(|| LoaderError::UnexpectedSection {
                    section: record.section.clone(),
                    expected: format!("{} or {}", sections[0].key(), sections[1].key()),
                })?;

            split[index].push(LineItemInput::new(
                record.name.trim(),
                record.cost,
                record.quantity,
            ));
        }

        debug!(
            first = split[0].len(),
            second = split[1].len(),
            "split imported line items"
        );
        Ok(split)
    }

    /// [`parse`](Self::parse) followed by [`split`](Self::split).
    pub fn load<R: Read>(
        reader: R,
        sections: [Category; 2],
    ) -> Result<[Vec<LineItemInput>; 2], LoaderError> {
        Self::split(Self::parse(reader)?, sections)
    }
}

/// One row of a labor CSV file: `position,rate,workers,hours,days`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LaborRecord {
    pub position: String,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub rate: Option<Decimal>,
    pub workers: Option<u32>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub hours: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub days: Option<Decimal>,
}

impl From<LaborRecord> for LaborInput {
    fn from(record: LaborRecord) -> Self {
        LaborInput {
            position: record.position.trim().to_string(),
            rate: record.rate,
            workers: record.workers,
            hours: record.hours,
            days: record.days,
        }
    }
}

/// Reader for labor position CSV files.
pub struct LaborLoader;

impl LaborLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<LaborRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: LaborRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn load<R: Read>(reader: R) -> Result<Vec<LaborInput>, LoaderError> {
        Ok(Self::parse(reader)?
            .into_iter()
            .map(LaborInput::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const WIRE_HEADER: &str = "section,name,cost,quantity\n";

    fn wire_csv(rows: &str) -> String {
        format!("{WIRE_HEADER}{rows}")
    }

    // =========================================================================
    // LineItemLoader::parse tests
    // =========================================================================

    #[test]
    fn test_parse_single_line_item() {
        let csv = wire_csv("awg,AWG 10,1.25,800");

        let records = LineItemLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![LineItemRecord {
                section: "awg".to_string(),
                name: "AWG 10".to_string(),
                cost: Some(dec!(1.25)),
                quantity: Some(dec!(800)),
            }]
        );
    }

    #[test]
    fn test_parse_blank_cells_are_not_populated() {
        let csv = wire_csv("conduit,1 in EMT,,\nconduit,3/4 in EMT,2.50,");

        let records = LineItemLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].cost, None);
        assert_eq!(records[0].quantity, None);
        assert_eq!(records[1].cost, Some(dec!(2.50)));
        assert_eq!(records[1].quantity, None);
    }

    #[test]
    fn test_parse_currency_formatting() {
        let csv = wire_csv("equipment,Pedestal,\"$1,050.00\",2");

        let records = LineItemLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].cost, Some(dec!(1050.00)));
    }

    #[test]
    fn test_parse_invalid_amount() {
        let csv = wire_csv("awg,AWG 10,abc,800");

        let err = LineItemLoader::parse(csv.as_bytes()).expect_err("Should fail for bad amount");
        let LoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("invalid amount 'abc'"),
            "Expected 'invalid amount' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_missing_column() {
        let csv = "section,name,cost\nawg,AWG 10,1.25";

        let err = LineItemLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");
        let LoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_empty_csv() {
        let records = LineItemLoader::parse(WIRE_HEADER.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // =========================================================================
    // LineItemLoader::split tests
    // =========================================================================

    #[test]
    fn test_split_keeps_order_per_section() {
        let csv = wire_csv("awg,A,1,1\nconduit,C,2,2\nawg,B,3,3");

        let [awg, conduit] = LineItemLoader::load(csv.as_bytes(), [Category::Awg, Category::Conduit])
            .expect("Failed to load");

        let names: Vec<_> = awg.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(conduit, vec![LineItemInput::new("C", Some(dec!(2)), Some(dec!(2)))]);
    }

    #[test]
    fn test_split_accepts_section_aliases() {
        let csv = wire_csv("Miscellaneous,Bollards,50,4");

        let [misc, equipment] =
            LineItemLoader::load(csv.as_bytes(), [Category::Misc, Category::Equipment])
                .expect("Failed to load");

        assert_eq!(misc.len(), 1);
        assert!(equipment.is_empty());
    }

    #[test]
    fn test_split_unknown_section() {
        let csv = wire_csv("cable,AWG 10,1.25,800");

        let result = LineItemLoader::load(csv.as_bytes(), [Category::Awg, Category::Conduit]);

        match result {
            Err(LoaderError::UnknownSection(ref section)) => assert_eq!(section, "cable"),
            other => panic!("expected UnknownSection, got {other:?}"),
        }
    }

    #[test]
    fn test_split_section_from_other_stage() {
        let csv = wire_csv("equipment,Pedestal,300,1");

        let result = LineItemLoader::load(csv.as_bytes(), [Category::Awg, Category::Conduit]);

        match result {
            Err(LoaderError::UnexpectedSection { section, expected }) => {
                assert_eq!(section, "equipment");
                assert_eq!(expected, "awg or conduit");
            }
            other => panic!("expected UnexpectedSection, got {other:?}"),
        }
    }

    // =========================================================================
    // LaborLoader tests
    // =========================================================================

    #[test]
    fn test_labor_parse_full_row() {
        let csv = "position,rate,workers,hours,days\nForeman,45,1,8,5";

        let positions = LaborLoader::load(csv.as_bytes()).expect("Failed to load labor");

        assert_eq!(
            positions,
            vec![LaborInput {
                position: "Foreman".to_string(),
                rate: Some(dec!(45)),
                workers: Some(1),
                hours: Some(dec!(8)),
                days: Some(dec!(5)),
            }]
        );
    }

    #[test]
    fn test_labor_blank_row_is_blank_input() {
        let csv = "position,rate,workers,hours,days\nApprentice,,,,";

        let positions = LaborLoader::load(csv.as_bytes()).expect("Failed to load labor");

        assert!(positions[0].is_blank());
    }

    #[test]
    fn test_labor_fractional_workers_rejected() {
        let csv = "position,rate,workers,hours,days\nForeman,45,1.5,8,5";

        let result = LaborLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(LoaderError::CsvParse(_))));
    }
}
