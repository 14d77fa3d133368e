pub mod calculations;
pub mod db;
pub mod input;
pub mod models;
pub mod wire;
pub mod workflow;

pub use db::repository::{EstimateRepository, RepositoryError};
pub use models::*;
