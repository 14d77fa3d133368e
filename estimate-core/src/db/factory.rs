use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::repository::{EstimateRepository, RepositoryError};

/// Which backend to open and how to reach it.
///
/// `connection_string` is handed to the matching factory as is:
///
/// | backend  | connection_string examples                 |
/// |----------|--------------------------------------------|
/// | `sqlite` | `estimates.db`, `:memory:`                 |
/// | `http`   | `https://estimator.example.com/portfolio`  |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Name of a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    #[serde(alias = "connection")]
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "estimates.db".to_string(),
        }
    }
}

/// Opens repositories for one backend. Backend crates export a unit struct
/// implementing this and register it at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase backend name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Opens a ready-to-use repository, running migrations if the backend
    /// has any.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError>;
}

/// Backend factories keyed by name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Adds a factory, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no such backend is registered.
    /// * Whatever the factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::models::{
        EstimationData, LaborEstimate, MiscEquipmentEstimate, NewProject, Project, ProjectListing,
        ProjectReview, ProjectSummary, WireConduitEstimate,
    };

    use super::{DbConfig, EstimateRepository, RepositoryError, RepositoryFactory, RepositoryRegistry};

    // Routing tests never touch the repository itself.
    struct NullRepository;

    #[async_trait]
    impl EstimateRepository for NullRepository {
        async fn create_project(
            &self,
            _project: NewProject,
        ) -> Result<Project, RepositoryError> {
            Err(RepositoryError::NotFound)
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
            Ok(())
        }
        async fn save_misc_equipment(
            &self,
            _estimate: &MiscEquipmentEstimate,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
        async fn save_labor(
            &self,
            _estimate: &LaborEstimate,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
        async fn get_estimation_data(
            &self,
            _project_id: i64,
        ) -> Result<EstimationData, RepositoryError> {
            Ok(EstimationData::default())
        }
        async fn save_summary(
            &self,
            _summary: &ProjectSummary,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    struct RecordingFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for RecordingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(NullRepository))
        }
    }

    struct BrokenFactory;

    #[async_trait]
    impl RepositoryFactory for BrokenFactory {
        fn backend_name(&self) -> &'static str {
            "broken"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
            Err(RepositoryError::Connection("server unreachable".to_string()))
        }
    }

    fn recording_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(RecordingFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    #[test]
    fn default_config_points_at_local_sqlite_file() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, "estimates.db");
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, _) = recording_factory("sqlite");
        let (http, _) = recording_factory("http");
        reg.register(sqlite);
        reg.register(http);

        assert_eq!(reg.available_backends(), vec!["http", "sqlite"]);
    }

    #[test]
    fn registering_same_name_twice_keeps_one_entry() {
        let mut reg = RepositoryRegistry::default();
        let (first, _) = recording_factory("sqlite");
        let (second, _) = recording_factory("sqlite");
        reg.register(first);
        reg.register(second);

        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn create_dispatches_to_named_backend_only() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = recording_factory("sqlite");
        let (http, http_called) = recording_factory("http");
        reg.register(sqlite);
        reg.register(http);

        let result = reg.create(&config("http")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(http_called.load(Ordering::SeqCst));
        assert!(!sqlite_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_available_ones() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, _) = recording_factory("sqlite");
        reg.register(sqlite);

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("sqlite"));
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn factory_errors_propagate() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(BrokenFactory));

        assert!(matches!(
            reg.create(&config("broken")).await,
            Err(RepositoryError::Connection(msg)) if msg == "server unreachable"
        ));
    }
}
