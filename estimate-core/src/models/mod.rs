mod category;
mod estimate;
mod line_item;
mod project;
mod review;
mod snapshot;
mod summary;

pub use category::Category;
pub use estimate::{EstimationData, LaborEstimate, MiscEquipmentEstimate, WireConduitEstimate};
pub use line_item::{LaborEntry, LaborInput, LineItem, LineItemInput, LowVoltageInput};
pub use project::{
    CUSTOM_PROJECT_TYPE, NewProject, Project, ProjectForm, ProjectStatus, ProjectValidationError,
};
pub use review::{ProjectListing, ProjectReview};
pub use snapshot::{EstimateSnapshot, SummaryField};
pub use summary::{CategoryLine, PercentageLine, ProjectSummary};
