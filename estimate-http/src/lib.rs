//! Estimator web API backend.

mod client;
mod factory;

pub use client::{DEFAULT_TIMEOUT, HttpRepository};
pub use factory::HttpRepositoryFactory;
