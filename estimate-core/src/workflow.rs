//! Stage sequencing over an [`EstimateRepository`].
//!
//! Every submit validates locally first; nothing reaches the backend unless
//! the form is valid. A failed submit leaves the project where it was.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::{
    LaborForm, MiscEquipmentForm, PricingCalculator, PricingResult, StageValidationError,
    WireConduitForm,
};
use crate::db::{EstimateRepository, RepositoryError};
use crate::models::{
    EstimateSnapshot, LaborEstimate, MiscEquipmentEstimate, Project, ProjectForm, ProjectListing,
    ProjectReview, ProjectSummary, ProjectValidationError, WireConduitEstimate,
};

/// The pages of the estimator, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NewProject,
    WireConduit,
    MiscEquipment,
    Labor,
    Summary,
    Projects,
}

impl Stage {
    /// The stage that follows a successful submit.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::NewProject => Some(Self::WireConduit),
            Self::WireConduit => Some(Self::MiscEquipment),
            Self::MiscEquipment => Some(Self::Labor),
            Self::Labor => Some(Self::Summary),
            Self::Summary => Some(Self::Projects),
            Self::Projects => None,
        }
    }

    /// Endpoint path relative to the API root.
    pub fn path(&self) -> &'static str {
        match self {
            Self::NewProject => "new_project",
            Self::WireConduit => "estimate_awg_cond",
            Self::MiscEquipment => "estimate_misc_equip",
            Self::Labor => "estimate_labor_cost",
            Self::Summary => "save_summary",
            Self::Projects => "projects",
        }
    }

    /// Location of this stage for a project, e.g.
    /// `estimate_misc_equip?project_id=7`.
    pub fn location(
        &self,
        project_id: i64,
    ) -> String {
        format!("{}?project_id={project_id}", self.path())
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Project(#[from] ProjectValidationError),

    #[error(transparent)]
    Validation(#[from] StageValidationError),

    #[error(transparent)]
    Backend(#[from] RepositoryError),
}

/// A stage record accepted by the backend, with where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome<T> {
    pub record: T,
    pub next_location: Option<String>,
}

impl<T> StageOutcome<T> {
    fn advance(
        stage: Stage,
        project_id: i64,
        record: T,
    ) -> Self {
        Self {
            record,
            next_location: stage.next().map(|next| next.location(project_id)),
        }
    }
}

pub struct EstimateWorkflow<'a> {
    repository: &'a dyn EstimateRepository,
    calculator: PricingCalculator,
}

impl<'a> EstimateWorkflow<'a> {
    pub fn new(
        repository: &'a dyn EstimateRepository,
        calculator: PricingCalculator,
    ) -> Self {
        Self {
            repository,
            calculator,
        }
    }

    pub fn calculator(&self) -> &PricingCalculator {
        &self.calculator
    }

    pub async fn create_project(
        &self,
        form: &ProjectForm,
    ) -> Result<StageOutcome<Project>, WorkflowError> {
        let new_project = form.validate().inspect_err(|error| {
            warn!(%error, "new project rejected");
        })?;

        let project = self.repository.create_project(new_project).await?;
        info!(project_id = project.id, address = %project.address, "project created");

        Ok(StageOutcome::advance(Stage::NewProject, project.id, project))
    }

    pub async fn submit_wire_conduit(
        &self,
        project_id: i64,
        form: &WireConduitForm,
    ) -> Result<StageOutcome<WireConduitEstimate>, WorkflowError> {
        let estimate = form
            .evaluate(project_id)
            .inspect_err(|error| warn!(project_id, %error, "wire & conduit rejected"))?;

        self.repository.save_wire_conduit(&estimate).await?;
        info!(project_id, grand_total = %estimate.grand_total, "wire & conduit saved");

        Ok(StageOutcome::advance(Stage::WireConduit, project_id, estimate))
    }

    pub async fn submit_misc_equipment(
        &self,
        project_id: i64,
        form: &MiscEquipmentForm,
    ) -> Result<StageOutcome<MiscEquipmentEstimate>, WorkflowError> {
        let estimate = form
            .evaluate(project_id)
            .inspect_err(|error| warn!(project_id, %error, "misc & equipment rejected"))?;

        self.repository.save_misc_equipment(&estimate).await?;
        info!(project_id, grand_total = %estimate.grand_total, "misc & equipment saved");

        Ok(StageOutcome::advance(Stage::MiscEquipment, project_id, estimate))
    }

    pub async fn submit_labor(
        &self,
        project_id: i64,
        form: &LaborForm,
    ) -> Result<StageOutcome<LaborEstimate>, WorkflowError> {
        let estimate = form
            .evaluate(project_id)
            .inspect_err(|error| warn!(project_id, %error, "labor rejected"))?;

        self.repository.save_labor(&estimate).await?;
        info!(project_id, grand_total = %estimate.grand_total, "labor saved");

        Ok(StageOutcome::advance(Stage::Labor, project_id, estimate))
    }

    /// Reads the stored stage totals into a fresh summary snapshot.
    pub async fn load_summary(
        &self,
        project_id: i64,
    ) -> Result<EstimateSnapshot, WorkflowError> {
        let data = self.repository.get_estimation_data(project_id).await?;
        debug!(project_id, ?data, "estimation data loaded");
        if !data.within_limits() {
            warn!(project_id, "stored totals out of range");
            return Err(RepositoryError::Database(format!(
                "stored totals for project {project_id} are out of range"
            ))
            .into());
        }

        Ok(EstimateSnapshot::from_estimation_data(project_id, &data))
    }

    pub fn price(
        &self,
        snapshot: &EstimateSnapshot,
    ) -> PricingResult {
        self.calculator.calculate(snapshot)
    }

    /// Prices the snapshot and stores the result as the project's summary.
    pub async fn save_summary(
        &self,
        snapshot: &EstimateSnapshot,
    ) -> Result<StageOutcome<ProjectSummary>, WorkflowError> {
        let summary = self.calculator.calculate(snapshot).into_summary(snapshot);

        self.repository.save_summary(&summary).await?;
        info!(
            project_id = summary.project_id,
            grand_total = %summary.grand_total,
            price_per_unit = %summary.price_per_unit,
            "summary saved"
        );

        Ok(StageOutcome::advance(Stage::Summary, summary.project_id, summary))
    }

    /// The project listing a saved summary leads to.
    pub async fn list_projects(&self) -> Result<Vec<ProjectListing>, WorkflowError> {
        let projects = self.repository.list_projects().await?;
        debug!(count = projects.len(), "projects listed");
        Ok(projects)
    }

    /// Everything stored for one project.
    pub async fn review_project(
        &self,
        project_id: i64,
    ) -> Result<ProjectReview, WorkflowError> {
        Ok(self.repository.get_project_review(project_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{
        Category, EstimationData, LineItemInput, NewProject, ProjectStatus, SummaryField,
    };

    /// Records what reached the backend.
    #[derive(Default)]
    struct RecordingRepository {
        saved: Mutex<Vec<String>>,
        data: EstimationData,
        reject: bool,
    }

    impl RecordingRepository {
        fn record(
            &self,
            what: &str,
        ) -> Result<(), RepositoryError> {
            if self.reject {
                return Err(RepositoryError::Rejected("Project not found".to_string()));
            }
            self.saved
                .lock()
                .map_err(|e| RepositoryError::Database(e.to_string()))?
                .push(what.to_string());
            Ok(())
        }

        fn saved(&self) -> Vec<String> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EstimateRepository for RecordingRepository {
        async fn create_project(
            &self,
            project: NewProject,
        ) -> Result<Project, RepositoryError> {
            self.record("project")?;
            Ok(Project {
                id: 7,
                address: project.address,
                company: project.company,
                start_date: project.start_date,
                project_type: project.project_type,
                chargers_count: project.chargers_count,
                status: ProjectStatus::Started,
                created_at: Utc::now(),
            })
        }
        async fn get_project(
            &self,
            _id: i64,
        ) -> Result<Project, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_projects(&self) -> Result<Vec<ProjectListing>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn get_project_review(
            &self,
            _id: i64,
        ) -> Result<ProjectReview, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn save_wire_conduit(
            &self,
            _estimate: &WireConduitEstimate,
        ) -> Result<(), RepositoryError> {
            self.record("wire_conduit")
        }
        async fn save_misc_equipment(
            &self,
            _estimate: &MiscEquipmentEstimate,
        ) -> Result<(), RepositoryError> {
            self.record("misc_equipment")
        }
        async fn save_labor(
            &self,
            _estimate: &LaborEstimate,
        ) -> Result<(), RepositoryError> {
            self.record("labor")
        }
        async fn get_estimation_data(
            &self,
            _project_id: i64,
        ) -> Result<EstimationData, RepositoryError> {
            Ok(self.data.clone())
        }
        async fn save_summary(
            &self,
            _summary: &ProjectSummary,
        ) -> Result<(), RepositoryError> {
            self.record("summary")
        }
    }

    fn workflow(repository: &RecordingRepository) -> EstimateWorkflow<'_> {
        EstimateWorkflow::new(repository, PricingCalculator::default())
    }

    fn wire_form() -> WireConduitForm {
        WireConduitForm {
            awg: vec![LineItemInput::new("AWG 10", Some(dec!(1.25)), Some(dec!(300)))],
            ..WireConduitForm::default()
        }
    }

    #[test]
    fn stage_locations_carry_project_id() {
        assert_eq!(
            Stage::NewProject.next().map(|s| s.location(12)),
            Some("estimate_awg_cond?project_id=12".to_string())
        );
        assert_eq!(Stage::Labor.next(), Some(Stage::Summary));
        assert_eq!(Stage::Projects.next(), None);
    }

    #[tokio::test]
    async fn create_project_points_to_wire_conduit() {
        let repository = RecordingRepository::default();
        let form = ProjectForm {
            address: "100 Main St".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            project_type: "Level 2".to_string(),
            chargers_count: Some(4),
            ..ProjectForm::default()
        };

        let outcome = workflow(&repository).create_project(&form).await.unwrap();

        assert_eq!(outcome.record.id, 7);
        assert_eq!(
            outcome.next_location.as_deref(),
            Some("estimate_awg_cond?project_id=7")
        );
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_backend() {
        let repository = RecordingRepository::default();

        let result = workflow(&repository)
            .submit_wire_conduit(7, &WireConduitForm::default())
            .await;

        assert!(matches!(result, Err(WorkflowError::Validation(_))));
        assert!(repository.saved().is_empty());
    }

    #[tokio::test]
    async fn backend_rejection_is_surfaced_without_next_location() {
        let repository = RecordingRepository {
            reject: true,
            ..RecordingRepository::default()
        };

        let result = workflow(&repository).submit_wire_conduit(7, &wire_form()).await;

        match result {
            Err(WorkflowError::Backend(RepositoryError::Rejected(msg))) => {
                assert_eq!(msg, "Project not found")
            }
            other => panic!("expected backend rejection, got {other:#?}"),
        }
    }

    #[tokio::test]
    async fn wire_conduit_submit_advances_to_misc_equipment() {
        let repository = RecordingRepository::default();

        let outcome = workflow(&repository)
            .submit_wire_conduit(7, &wire_form())
            .await
            .unwrap();

        assert_eq!(outcome.record.grand_total, dec!(375.00));
        assert_eq!(
            outcome.next_location.as_deref(),
            Some("estimate_misc_equip?project_id=7")
        );
        assert_eq!(repository.saved(), vec!["wire_conduit"]);
    }

    #[tokio::test]
    async fn summary_loads_prices_and_saves() {
        let repository = RecordingRepository {
            data: EstimationData {
                awg_total: dec!(1000),
                conduit_total: dec!(500),
                misc_total: dec!(200),
                equipment_total: dec!(300),
                labor_total: dec!(800),
                chargers_count: 5,
                ..EstimationData::default()
            },
            ..RecordingRepository::default()
        };
        let flow = workflow(&repository);

        let snapshot = flow
            .load_summary(7)
            .await
            .unwrap()
            .with_edit(SummaryField::BaseCost(Category::Permits), "100");
        let priced = flow.price(&snapshot);
        let outcome = flow.save_summary(&snapshot).await.unwrap();

        assert_eq!(priced.price_per_unit, dec!(629.30));
        assert_eq!(outcome.record.price_per_unit, dec!(629.30));
        assert_eq!(
            outcome.next_location.as_deref(),
            Some("projects?project_id=7")
        );
        assert_eq!(repository.saved(), vec!["summary"]);
    }

    #[tokio::test]
    async fn review_of_unknown_project_is_not_found() {
        let repository = RecordingRepository::default();

        let result = workflow(&repository).review_project(404).await;

        assert!(matches!(
            result,
            Err(WorkflowError::Backend(RepositoryError::NotFound))
        ));
    }

    #[tokio::test]
    async fn summary_refuses_out_of_range_totals() {
        let repository = RecordingRepository {
            data: EstimationData {
                awg_total: dec!(1000000000000000000000000000),
                ..EstimationData::default()
            },
            ..RecordingRepository::default()
        };

        let result = workflow(&repository).load_summary(7).await;

        assert!(matches!(
            result,
            Err(WorkflowError::Backend(RepositoryError::Database(_)))
        ));
    }
}
