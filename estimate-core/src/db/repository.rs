use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    EstimationData, LaborEstimate, MiscEquipmentEstimate, NewProject, Project, ProjectListing,
    ProjectReview, ProjectSummary, WireConduitEstimate,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The project is not at a stage that allows the write.
    #[error("Invalid project state: {0}")]
    InvalidState(String),

    /// The backend answered but refused the request.
    #[error("{0}")]
    Rejected(String),
}

/// Persistence boundary for projects and their stage records.
///
/// Each `save_*` call replaces the stage's previous record for the project and
/// advances the project status.
#[async_trait]
pub trait EstimateRepository: Send + Sync {
    // Projects
    async fn create_project(&self, project: NewProject) -> Result<Project, RepositoryError>;
    async fn get_project(&self, id: i64) -> Result<Project, RepositoryError>;

    /// Every project, most recent start date first.
    async fn list_projects(&self) -> Result<Vec<ProjectListing>, RepositoryError>;

    /// The project with whatever stage records and summary it has so far.
    async fn get_project_review(&self, id: i64) -> Result<ProjectReview, RepositoryError>;

    // Stage records
    async fn save_wire_conduit(
        &self,
        estimate: &WireConduitEstimate,
    ) -> Result<(), RepositoryError>;

    async fn save_misc_equipment(
        &self,
        estimate: &MiscEquipmentEstimate,
    ) -> Result<(), RepositoryError>;

    async fn save_labor(&self, estimate: &LaborEstimate) -> Result<(), RepositoryError>;

    // Summary
    async fn get_estimation_data(
        &self,
        project_id: i64,
    ) -> Result<EstimationData, RepositoryError>;

    async fn save_summary(&self, summary: &ProjectSummary) -> Result<(), RepositoryError>;
}
