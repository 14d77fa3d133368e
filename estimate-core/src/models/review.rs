use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::estimate::{LaborEstimate, MiscEquipmentEstimate, WireConduitEstimate};
use super::project::Project;
use super::summary::ProjectSummary;

/// One row of the project listing.
///
/// `chargers_count` is the count supplied on the labor stage and stays `None`
/// until labor is submitted; the approval fields come from the saved summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectListing {
    pub project: Project,
    pub chargers_count: Option<u32>,
    pub approved: Option<bool>,
    pub approved_amount: Option<Decimal>,
    pub total_submitted: Option<Decimal>,
}

/// Everything stored for a project, stage by stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReview {
    pub project: Project,
    pub wire_conduit: Option<WireConduitEstimate>,
    pub misc_equipment: Option<MiscEquipmentEstimate>,
    pub labor: Option<LaborEstimate>,
    pub summary: Option<ProjectSummary>,
}
