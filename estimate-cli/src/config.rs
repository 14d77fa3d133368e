//! `estimator.toml` loading.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via [`AppConfig::apply_overrides`])
//! 2. The file given with `--config`, or `estimator.toml` in the working
//!    directory when present
//! 3. Compiled defaults

use std::fs;
use std::path::{Path, PathBuf};

use estimate_core::calculations::{PricingConfig, PricingConfigError};
use estimate_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "estimator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("invalid [pricing] section: {0}")]
    Pricing(#[from] PricingConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Log file opened in append mode, in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<String>,
    pub connection: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `path`, or the default file if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.pricing.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parses a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.pricing.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(
        mut self,
        cli: &CliOverrides,
    ) -> Self {
        if let Some(backend) = &cli.backend {
            self.database.backend = backend.clone();
        }
        if let Some(connection) = &cli.connection {
            self.database.connection_string = connection.clone();
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use estimate_core::Category;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            backend = "http"
            connection = "https://estimator.example.com/portfolio"

            [pricing]
            default_overhead_percentage = "10"
            reduced_exclusions = ["low_voltage", "permits"]

            [logging]
            level = "debug"
            file = "estimator.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, "http");
        assert_eq!(
            config.database.connection_string,
            "https://estimator.example.com/portfolio"
        );
        assert_eq!(config.pricing.default_overhead_percentage, dec!(10));
        assert_eq!(config.pricing.default_tax_percentage, dec!(30));
        assert_eq!(
            config.pricing.reduced_exclusions,
            BTreeSet::from([Category::LowVoltage, Category::Permits])
        );
        assert_eq!(config.logging.file, Some(PathBuf::from("estimator.log")));
    }

    #[test]
    fn invalid_pricing_defaults_are_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [pricing]
            default_markup = "0"
            "#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::Pricing(PricingConfigError::InvalidDefaultMarkup(_)))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = AppConfig::from_toml("[database\nbackend = 1");

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_category_is_a_parse_error() {
        let result = AppConfig::from_toml(
            r#"
            [pricing]
            tax_base = ["awg", "solar"]
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/estimator.toml")));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn cli_flags_win_over_file() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            connection = "shop.db"
            "#,
        )
        .unwrap()
        .apply_overrides(&CliOverrides {
            connection: Some(":memory:".to_string()),
            log_level: Some("warn".to_string()),
            ..CliOverrides::default()
        });

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.logging.level, "warn");
    }
}
