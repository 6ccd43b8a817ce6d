//! Configuration Loader
//!
//! Environment-aware configuration loading. Merges the layered sources in
//! precedence order: `config/default.yaml`, then `config/{environment}.yaml`,
//! then `COMPENSATION_*` environment variables. Missing files fall through to
//! the built-in defaults.

use super::error::ConfigResult;
use super::CoreConfig;
use ::config::{Config, Environment, File};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Loaded configuration together with its provenance
pub struct ConfigManager {
    config: CoreConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for tests that must not touch process-global environment state.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config: CoreConfig = Config::builder()
            .add_source(File::from(config_directory.join("default")).required(false))
            .add_source(File::from(config_directory.join(environment)).required(false))
            .add_source(
                Environment::with_prefix("COMPENSATION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!(
            environment = %environment,
            queue = %config.queue.stream_key(),
            group = %config.queue.group,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Environment this configuration was loaded for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Directory the file layers were read from
    pub fn config_directory(&self) -> &PathBuf {
        &self.config_directory
    }

    /// Detect the running environment from environment variables
    fn detect_environment() -> String {
        env::var("COMPENSATION_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
