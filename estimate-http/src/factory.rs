use async_trait::async_trait;
use tracing::info;

use estimate_core::db::{DbConfig, RepositoryFactory};
use estimate_core::{EstimateRepository, RepositoryError};

use crate::client::{DEFAULT_TIMEOUT, HttpRepository};

/// [`RepositoryFactory`] for the estimator web API.
///
/// `connection_string` is the API root, e.g.
/// `https://estimator.example.com/portfolio`. No request is made until the
/// first repository call.
pub struct HttpRepositoryFactory;

#[async_trait]
impl RepositoryFactory for HttpRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        let repo = HttpRepository::new(&config.connection_string, DEFAULT_TIMEOUT)?;
        info!(base_url = repo.base_url(), "using estimator API");
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use estimate_core::RepositoryError;
    use estimate_core::db::{DbConfig, RepositoryFactory, RepositoryRegistry};

    use super::HttpRepositoryFactory;

    fn config(connection_string: &str) -> DbConfig {
        DbConfig {
            backend: "http".to_string(),
            connection_string: connection_string.to_string(),
        }
    }

    #[test]
    fn backend_name_is_http() {
        assert_eq!(HttpRepositoryFactory.backend_name(), "http");
    }

    #[tokio::test]
    async fn registry_opens_http_backend() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(HttpRepositoryFactory));

        let result = registry.create(&config("http://localhost:5000/portfolio")).await;

        assert!(result.is_ok(), "failed to open http backend: {:#?}", result.err());
    }

    #[tokio::test]
    async fn file_path_is_rejected() {
        let result = HttpRepositoryFactory.create(&config("estimates.db")).await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }
}
