use async_trait::async_trait;
use tracing::info;

use estimate_core::db::{DbConfig, RepositoryFactory};
use estimate_core::{EstimateRepository, RepositoryError};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`estimate_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use estimate_core::db::RepositoryRegistry;
/// use estimate_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens the database described by `config.connection_string` and brings
    /// its schema up to date.
    ///
    /// Accepted values:
    /// * A bare file path, e.g. `"estimates.db"`. Created if missing.
    /// * `":memory:"` for an ephemeral database.
    /// * A sqlx URL such as `"sqlite:estimates.db?mode=rwc"`.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        let repo = SqliteRepository::connect(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(connection_string = %config.connection_string, "opened sqlite repository");
        Ok(Box::new(repo))
    }
}
