//! Configuration Loader
//!
//! Layers built-in defaults, an optional config file, environment variables and
//! command-line overrides into a validated [`MigrationConfig`].

use super::error::ConfigResult;
use super::MigrationConfig;
use crate::constants::defaults;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Values supplied on the command line; `None` leaves lower layers untouched
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub authorization: Option<String>,
    pub host: Option<String>,
    pub concurrency: Option<usize>,
    pub batch_size: Option<usize>,
    pub batch_concurrent_limit: Option<usize>,
    pub batch_pause_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub error_log_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    fn apply(
        &self,
        mut builder: ConfigBuilder<DefaultState>,
    ) -> ConfigResult<ConfigBuilder<DefaultState>> {
        if let Some(authorization) = &self.authorization {
            builder = builder.set_override("api.authorization", authorization.as_str())?;
        }
        if let Some(host) = &self.host {
            builder = builder.set_override("api.host", host.as_str())?;
        }
        if let Some(concurrency) = self.concurrency {
            builder = builder.set_override("batch.concurrency", to_i64(concurrency as u64))?;
        }
        if let Some(batch_size) = self.batch_size {
            builder = builder.set_override("batch.batch_size", to_i64(batch_size as u64))?;
        }
        if let Some(limit) = self.batch_concurrent_limit {
            builder = builder.set_override("batch.batch_concurrent_limit", to_i64(limit as u64))?;
        }
        if let Some(pause_ms) = self.batch_pause_ms {
            builder = builder.set_override("batch.batch_pause_ms", to_i64(pause_ms))?;
        }
        if let Some(attempts) = self.retry_attempts {
            builder = builder.set_override("retry.attempts", i64::from(attempts))?;
        }
        if let Some(delay_ms) = self.retry_delay_ms {
            builder = builder.set_override("retry.delay_ms", to_i64(delay_ms))?;
        }
        if let Some(output_dir) = &self.output_dir {
            builder =
                builder.set_override("output.output_dir", output_dir.to_string_lossy().as_ref())?;
        }
        if let Some(error_log_dir) = &self.error_log_dir {
            builder = builder.set_override(
                "output.error_log_dir",
                error_log_dir.to_string_lossy().as_ref(),
            )?;
        }
        Ok(builder)
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Loaded and validated configuration for one run
#[derive(Debug)]
pub struct ConfigManager {
    config: MigrationConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load(
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_with_env(config_file, overrides, &environment)
    }

    /// Load configuration with an explicit environment name
    pub fn load_with_env(
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder = overrides.apply(builder)?;

        let config: MigrationConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_file: config_file.map(Path::to_path_buf),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Report the effective configuration
    ///
    /// Loading happens before logging is initialised, so the caller emits this
    /// once a subscriber is in place.
    pub fn log_summary(&self) {
        let config = &self.config;
        info!(
            environment = %self.environment,
            config_file = ?self.config_file,
            api_host = %config.api.host,
            concurrency = config.batch.concurrency,
            batch_size = config.batch.batch_size,
            batch_concurrent_limit = config.batch.batch_concurrent_limit,
            retry_attempts = config.retry.attempts,
            "Configuration loaded"
        );
        debug!(
            "Effective configuration: {}",
            serde_json::to_string_pretty(&config.sanitized())
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
    }

    /// Detect current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("LOYALTY_MIGRATOR_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }
}
