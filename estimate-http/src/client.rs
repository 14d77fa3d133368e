use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use estimate_core::wire::{
    EstimationDataResponse, LaborPayload, MiscEquipmentPayload, NewProjectPayload,
    ProjectListResponse, ProjectResponse, ProjectReviewResponse, StageResponse, SummaryPayload,
    WireConduitPayload,
};
use estimate_core::workflow::Stage;
use estimate_core::{
    EstimateRepository, EstimationData, LaborEstimate, MiscEquipmentEstimate, NewProject, Project,
    ProjectListing, ProjectReview, ProjectStatus, ProjectSummary, RepositoryError,
    WireConduitEstimate,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ESTIMATION_DATA_PATH: &str = "estimation_data";
const PROJECT_PATH: &str = "project";
const PROJECT_REVIEW_PATH: &str = "project_review";

/// [`EstimateRepository`] over the estimator's JSON API.
///
/// Every call is a single request; nothing is retried. Stage gating is left
/// to the server.
pub struct HttpRepository {
    client: Client,
    base_url: String,
}

impl HttpRepository {
    /// `base_url` is the API root the stage paths hang off, e.g.
    /// `https://estimator.example.com/portfolio`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RepositoryError::Configuration(format!(
                "API root must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(
        &self,
        path: &str,
    ) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize>(
        &self,
        stage: Stage,
        body: &B,
    ) -> Result<Option<i64>, RepositoryError> {
        let url = self.endpoint(stage.path());
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        read_reply::<StageResponse>(status, &text)?.into_result()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        project_id: Option<i64>,
    ) -> Result<T, RepositoryError> {
        let url = self.endpoint(path);
        debug!(%url, ?project_id, "GET");

        let mut request = self.client.get(&url);
        if let Some(project_id) = project_id {
            request = request.query(&[("project_id", project_id)]);
        }
        let response = request
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        read_reply(status, &text)
    }
}

fn transport_error(e: reqwest::Error) -> RepositoryError {
    RepositoryError::Connection(e.to_string())
}

/// Decodes a reply body.
///
/// 404 is [`RepositoryError::NotFound`]. Any other non-2xx status is a
/// rejection carrying the server's `message` or `error` text when the body
/// has one.
fn read_reply<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, RepositoryError> {
    if status == StatusCode::NOT_FOUND {
        return Err(RepositoryError::NotFound);
    }
    if !status.is_success() {
        let message = serde_json::from_str::<StageResponse>(body)
            .ok()
            .and_then(|reply| reply.message.or(reply.error))
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(RepositoryError::Rejected(message));
    }

    serde_json::from_str(body)
        .map_err(|e| RepositoryError::Database(format!("Malformed reply from server: {}", e)))
}

#[async_trait]
impl EstimateRepository for HttpRepository {
    async fn create_project(
        &self,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        let id = self
            .post(Stage::NewProject, &NewProjectPayload::from(&project))
            .await?
            .ok_or_else(|| {
                RepositoryError::Database("new project reply carried no project_id".to_string())
            })?;

        Ok(Project {
            id,
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
        id: i64,
    ) -> Result<Project, RepositoryError> {
        self.get::<ProjectResponse>(PROJECT_PATH, Some(id))
            .await?
            .into_project()
    }

    async fn list_projects(&self) -> Result<Vec<ProjectListing>, RepositoryError> {
        self.get::<ProjectListResponse>(Stage::Projects.path(), None)
            .await?
            .into_listing()
    }

    async fn get_project_review(
        &self,
        id: i64,
    ) -> Result<ProjectReview, RepositoryError> {
        self.get::<ProjectReviewResponse>(PROJECT_REVIEW_PATH, Some(id))
            .await?
            .into_review()
    }

    async fn save_wire_conduit(
        &self,
        estimate: &WireConduitEstimate,
    ) -> Result<(), RepositoryError> {
        self.post(Stage::WireConduit, &WireConduitPayload::from(estimate))
            .await
            .map(|_| ())
    }

    async fn save_misc_equipment(
        &self,
        estimate: &MiscEquipmentEstimate,
    ) -> Result<(), RepositoryError> {
        self.post(Stage::MiscEquipment, &MiscEquipmentPayload::from(estimate))
            .await
            .map(|_| ())
    }

    async fn save_labor(
        &self,
        estimate: &LaborEstimate,
    ) -> Result<(), RepositoryError> {
        self.post(Stage::Labor, &LaborPayload::from(estimate))
            .await
            .map(|_| ())
    }

    async fn get_estimation_data(
        &self,
        project_id: i64,
    ) -> Result<EstimationData, RepositoryError> {
        self.get::<EstimationDataResponse>(ESTIMATION_DATA_PATH, Some(project_id))
            .await?
            .into_data()
    }

    async fn save_summary(
        &self,
        summary: &ProjectSummary,
    ) -> Result<(), RepositoryError> {
        self.post(Stage::Summary, &SummaryPayload::from(summary))
            .await
            .map(|_| ())
    }
}
