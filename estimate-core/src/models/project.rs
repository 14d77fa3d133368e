use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Progress marker stored on a project; each submitted stage advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Started,
    WireConduitSubmitted,
    MiscEquipmentSubmitted,
    LaborCostSubmitted,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::WireConduitSubmitted => "wire_conduit_submitted",
            Self::MiscEquipmentSubmitted => "misc_equipment_submitted",
            Self::LaborCostSubmitted => "labor_cost_submitted",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "started" => Some(Self::Started),
            "wire_conduit_submitted" => Some(Self::WireConduitSubmitted),
            "misc_equipment_submitted" => Some(Self::MiscEquipmentSubmitted),
            "labor_cost_submitted" => Some(Self::LaborCostSubmitted),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub address: String,
    pub company: Option<String>,
    pub start_date: NaiveDate,
    pub project_type: String,
    pub chargers_count: u32,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

/// For creating new projects (no id, status or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub address: String,
    pub company: Option<String>,
    pub start_date: NaiveDate,
    pub project_type: String,
    pub chargers_count: u32,
}

/// Project type value that switches the form to the free-text custom type.
pub const CUSTOM_PROJECT_TYPE: &str = "custom";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectValidationError {
    #[error("Please fill out all required fields.")]
    MissingRequired(Vec<&'static str>),

    #[error("Number of chargers must be at least 1")]
    ChargersCountTooLow,

    #[error("Please enter a custom project type.")]
    MissingCustomType,
}

/// Raw values of the new-project form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub address: String,
    pub company: String,
    pub start_date: Option<NaiveDate>,
    pub project_type: String,
    pub custom_project_type: String,
    pub chargers_count: Option<i64>,
}

impl ProjectForm {
    /// Checks the form and produces the record to create.
    ///
    /// Required fields are reported together; the chargers-count floor and the
    /// custom-type rule are checked only once every required field is present.
    pub fn validate(&self) -> Result<NewProject, ProjectValidationError> {
        let address = self.address.trim();

        let mut missing = Vec::new();
        if address.is_empty() {
            missing.push("address");
        }
        if self.start_date.is_none() {
            missing.push("start_date");
        }
        if self.chargers_count.is_none() {
            missing.push("chargers_count");
        }

        let (Some(start_date), Some(chargers_count)) = (self.start_date, self.chargers_count)
        else {
            return Err(ProjectValidationError::MissingRequired(missing));
        };
        if !missing.is_empty() {
            return Err(ProjectValidationError::MissingRequired(missing));
        }

        let chargers_count = u32::try_from(chargers_count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or(ProjectValidationError::ChargersCountTooLow)?;

        let project_type = if self.project_type.trim() == CUSTOM_PROJECT_TYPE {
            let custom = self.custom_project_type.trim();
            if custom.is_empty() {
                return Err(ProjectValidationError::MissingCustomType);
            }
            custom.to_string()
        } else {
            self.project_type.trim().to_string()
        };

        let company = self.company.trim();

        Ok(NewProject {
            address: address.to_string(),
            company: (!company.is_empty()).then(|| company.to_string()),
            start_date,
            project_type,
            chargers_count,
        })
    }
}
