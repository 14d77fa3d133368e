//! JSON bodies exchanged with the estimator web API.
//!
//! Field names follow the API exactly, which mixes camelCase stage fields
//! (`awgData`, `grandTotal`) with snake_case ones (`notes_awg`, `project_id`).
//! Request bodies carry money as JSON numbers; replies are read leniently and
//! accept numbers, numeric strings or `null`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::RepositoryError;
use crate::models::{
    Category, EstimationData, LaborEstimate, LineItem, MiscEquipmentEstimate, NewProject, Project,
    ProjectListing, ProjectReview, ProjectSummary, WireConduitEstimate,
};

/// A money value sent as a JSON number; the API rejects numeric fields sent
/// as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(#[serde(with = "rust_decimal::serde::float")] pub Decimal);

/// Body of `POST new_project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProjectPayload {
    pub address: String,
    pub company: String,
    pub start_date: NaiveDate,
    pub p_type: String,
    pub chargers_count: u32,
}

impl From<&NewProject> for NewProjectPayload {
    fn from(project: &NewProject) -> Self {
        Self {
            address: project.address.clone(),
            company: project.company.clone().unwrap_or_default(),
            start_date: project.start_date,
            p_type: project.project_type.clone(),
            chargers_count: project.chargers_count,
        }
    }
}

/// A wire or conduit line: cost per foot times length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthItemPayload {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub length: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

impl From<&LineItem> for LengthItemPayload {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            cost: item.cost,
            length: item.quantity,
            subtotal: item.subtotal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityItemPayload {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

impl From<&LineItem> for QuantityItemPayload {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            cost: item.cost,
            quantity: item.quantity,
            subtotal: item.subtotal,
        }
    }
}

/// Body of `POST estimate_awg_cond`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConduitPayload {
    pub project_id: i64,
    #[serde(rename = "awgData")]
    pub awg_data: Vec<LengthItemPayload>,
    #[serde(rename = "conduitData")]
    pub conduit_data: Vec<LengthItemPayload>,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(rename = "taxAmount")]
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(rename = "grandTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    #[serde(rename = "awgTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub awg_total: Decimal,
    #[serde(rename = "conduitTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub conduit_total: Decimal,
    pub notes_awg: String,
    pub notes_conduit: String,
}

impl From<&WireConduitEstimate> for WireConduitPayload {
    fn from(estimate: &WireConduitEstimate) -> Self {
        Self {
            project_id: estimate.project_id,
            awg_data: estimate.awg_entries.iter().map(Into::into).collect(),
            conduit_data: estimate.conduit_entries.iter().map(Into::into).collect(),
            tax: estimate.sales_tax_percentage,
            tax_amount: estimate.sales_tax_amount,
            grand_total: estimate.grand_total,
            awg_total: estimate.awg_total,
            conduit_total: estimate.conduit_total,
            notes_awg: estimate.notes_awg.clone(),
            notes_conduit: estimate.notes_conduit.clone(),
        }
    }
}

/// Body of `POST estimate_misc_equip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscEquipmentPayload {
    pub project_id: i64,
    #[serde(rename = "miscData")]
    pub misc_data: Vec<QuantityItemPayload>,
    #[serde(rename = "equipmentData")]
    pub equipment_data: Vec<QuantityItemPayload>,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(rename = "taxAmountTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount_total: Decimal,
    #[serde(rename = "grandTotalMisc")]
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total_misc: Decimal,
    #[serde(rename = "grandTotalEquipment")]
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total_equipment: Decimal,
    #[serde(rename = "grandTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    #[serde(rename = "miscTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub misc_total: Decimal,
    #[serde(rename = "equipmentTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub equipment_total: Decimal,
    pub notes_misc: String,
    pub notes_equip: String,
}

impl From<&MiscEquipmentEstimate> for MiscEquipmentPayload {
    fn from(estimate: &MiscEquipmentEstimate) -> Self {
        Self {
            project_id: estimate.project_id,
            misc_data: estimate.misc_entries.iter().map(Into::into).collect(),
            equipment_data: estimate.equipment_entries.iter().map(Into::into).collect(),
            tax: estimate.sales_tax_percentage,
            tax_amount_total: estimate.sales_tax_amount,
            grand_total_misc: estimate.misc_grand_total,
            grand_total_equipment: estimate.equipment_grand_total,
            grand_total: estimate.grand_total,
            misc_total: estimate.misc_total,
            equipment_total: estimate.equipment_total,
            notes_misc: estimate.notes_misc.clone(),
            notes_equip: estimate.notes_equipment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborItemPayload {
    pub position: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub workers: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub hours: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub days: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowVoltagePayload {
    pub chargers_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub charger_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// Body of `POST estimate_labor_cost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborPayload {
    pub project_id: i64,
    #[serde(rename = "laborData")]
    pub labor_data: Vec<LaborItemPayload>,
    #[serde(rename = "lowVoltageData")]
    pub low_voltage_data: LowVoltagePayload,
    #[serde(rename = "laborTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub labor_total: Decimal,
    #[serde(rename = "lowVoltageTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub low_voltage_total: Decimal,
    #[serde(rename = "grandTotal")]
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

impl From<&LaborEstimate> for LaborPayload {
    fn from(estimate: &LaborEstimate) -> Self {
        Self {
            project_id: estimate.project_id,
            labor_data: estimate
                .labor_entries
                .iter()
                .map(|entry| LaborItemPayload {
                    position: entry.position.clone(),
                    rate: entry.rate,
                    workers: entry.workers,
                    hours: entry.hours,
                    days: entry.days,
                    subtotal: entry.subtotal,
                })
                .collect(),
            low_voltage_data: LowVoltagePayload {
                chargers_count: estimate.chargers_count,
                charger_price: estimate.charger_price,
                subtotal: estimate.low_voltage_total,
            },
            labor_total: estimate.labor_total,
            low_voltage_total: estimate.low_voltage_total,
            grand_total: estimate.grand_total,
        }
    }
}

/// Body of `POST save_summary`: one flat record.
///
/// Category columns are `<key>_base_cost`, `<key>_markup`, `<key>_subtotal`
/// and `<key>_profit` for every [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub project_id: i64,
    #[serde(flatten)]
    pub category_columns: BTreeMap<String, Amount>,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_base_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub overhead_base_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub overhead_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub overhead_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_charger: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_charger_submitted: Decimal,
    pub approved: Option<bool>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_submitted: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub approved_amount: Decimal,
    pub notes: String,
}

impl From<&ProjectSummary> for SummaryPayload {
    fn from(summary: &ProjectSummary) -> Self {
        let mut category_columns = BTreeMap::new();
        for category in Category::ALL {
            let line = summary.line(category);
            let key = category.key();
            category_columns.insert(format!("{key}_base_cost"), Amount(line.base_cost));
            category_columns.insert(format!("{key}_markup"), Amount(line.markup));
            category_columns.insert(format!("{key}_subtotal"), Amount(line.subtotal));
            category_columns.insert(format!("{key}_profit"), Amount(line.profit));
        }

        Self {
            project_id: summary.project_id,
            category_columns,
            tax_base_cost: summary.tax.base_cost,
            tax_percentage: summary.tax.percentage,
            tax_subtotal: summary.tax.subtotal,
            overhead_base_cost: summary.overhead.base_cost,
            overhead_percentage: summary.overhead.percentage,
            overhead_subtotal: summary.overhead.subtotal,
            grand_subtotal: summary.grand_subtotal,
            grand_total: summary.grand_total,
            price_per_charger: summary.price_per_unit,
            price_per_charger_submitted: summary.price_per_unit_submitted,
            approved: summary.approved,
            total_submitted: summary.total_submitted,
            approved_amount: summary.approved_amount,
            notes: summary.notes.clone(),
        }
    }
}

/// Reply to every stage `POST`.
///
/// Project creation answers `{project_id, status}` without a `success` flag;
/// failures there carry an `error` text instead of `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResponse {
    /// Turns an unsuccessful reply into [`RepositoryError::Rejected`].
    pub fn into_result(self) -> Result<Option<i64>, RepositoryError> {
        let succeeded = self.success.unwrap_or(self.error.is_none());
        if succeeded {
            return Ok(self.project_id);
        }
        Err(RepositoryError::Rejected(
            self.message
                .or(self.error)
                .unwrap_or_else(|| "Request was not successful".to_string()),
        ))
    }
}

/// Reply to `GET estimation_data`.
///
/// Totals of stages that were never submitted may be missing or `null`; they
/// read back as zero. A reply without `misc_tax_percentage` applies
/// `tax_percentage` to both material stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationDataResponse {
    pub success: bool,
    pub message: Option<String>,
    pub awg_total: Option<Decimal>,
    pub conduit_total: Option<Decimal>,
    pub misc_total: Option<Decimal>,
    pub equipment_total: Option<Decimal>,
    pub labor_total: Option<Decimal>,
    pub low_voltage_total: Option<Decimal>,
    pub chargers_count: Option<u32>,
    pub approved: Option<bool>,
    pub total_submitted: Option<Decimal>,
    pub approved_amount: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub misc_tax_percentage: Option<Decimal>,
}

impl EstimationDataResponse {
    pub fn into_data(self) -> Result<EstimationData, RepositoryError> {
        if !self.success {
            return Err(RepositoryError::Rejected(
                self.message
                    .unwrap_or_else(|| "Estimation data unavailable".to_string()),
            ));
        }
        let zero = Decimal::ZERO;
        let tax_percentage = self.tax_percentage.unwrap_or(zero);
        Ok(EstimationData {
            awg_total: self.awg_total.unwrap_or(zero),
            conduit_total: self.conduit_total.unwrap_or(zero),
            misc_total: self.misc_total.unwrap_or(zero),
            equipment_total: self.equipment_total.unwrap_or(zero),
            labor_total: self.labor_total.unwrap_or(zero),
            low_voltage_total: self.low_voltage_total.unwrap_or(zero),
            chargers_count: self.chargers_count.unwrap_or(0),
            approved: self.approved,
            total_submitted: self.total_submitted,
            approved_amount: self.approved_amount,
            tax_percentage,
            misc_tax_percentage: self.misc_tax_percentage.unwrap_or(tax_percentage),
        })
    }
}

/// Reply to `GET project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub success: bool,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProjectResponse {
    pub fn into_project(self) -> Result<Project, RepositoryError> {
        match (self.success, self.project) {
            (true, Some(project)) => Ok(project),
            (true, None) => Err(RepositoryError::NotFound),
            (false, _) => Err(RepositoryError::Rejected(
                self.message
                    .unwrap_or_else(|| "Project unavailable".to_string()),
            )),
        }
    }
}

/// Reply to `GET projects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectListResponse {
    pub success: bool,
    pub message: Option<String>,
    pub projects: Vec<ProjectListing>,
}

impl ProjectListResponse {
    pub fn into_listing(self) -> Result<Vec<ProjectListing>, RepositoryError> {
        if !self.success {
            return Err(RepositoryError::Rejected(
                self.message
                    .unwrap_or_else(|| "Project listing unavailable".to_string()),
            ));
        }
        Ok(self.projects)
    }
}

/// Reply to `GET project_review`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectReviewResponse {
    pub success: bool,
    pub message: Option<String>,
    pub review: Option<ProjectReview>,
}

impl ProjectReviewResponse {
    pub fn into_review(self) -> Result<ProjectReview, RepositoryError> {
        match (self.success, self.review) {
            (true, Some(review)) => Ok(review),
            (true, None) => Err(RepositoryError::NotFound),
            (false, _) => Err(RepositoryError::Rejected(
                self.message
                    .unwrap_or_else(|| "Project review unavailable".to_string()),
            )),
        }
    }
}
