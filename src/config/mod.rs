//! # Migration Configuration System
//!
//! Typed configuration for a migration run. Every knob has a built-in default;
//! values are layered from an optional config file, `LOYALTY_MIGRATOR__*`
//! environment variables and finally command-line flags (see [`ConfigManager`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use loyalty_migrator::config::{ConfigManager, ConfigOverrides};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let overrides = ConfigOverrides {
//!     authorization: Some("Basic c2VjcmV0".to_string()),
//!     concurrency: Some(10),
//!     ..Default::default()
//! };
//! let manager = ConfigManager::load(None, &overrides)?;
//! let batch_size = manager.config().batch.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::{ConfigManager, ConfigOverrides};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Upstream loyalty API connection settings
    pub api: ApiConfig,

    /// Macro-batch, sub-group and concurrency settings
    pub batch: BatchConfig,

    /// Per-request retry settings
    pub retry: RetryConfig,

    /// Artifact destinations
    pub output: OutputConfig,

    /// Structured logging settings
    pub logging: LoggingConfig,
}

/// Upstream loyalty API configuration
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host of the loyalty details API, without scheme
    pub host: String,
    /// Value sent verbatim in the `Authorization` header
    pub authorization: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: defaults::API_HOST.to_string(),
            authorization: String::new(),
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
        }
    }
}

// Keep the credential out of debug output
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("authorization", &mask_secret(&self.authorization))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Batching and concurrency configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum sub-group requests in flight across the whole run
    pub concurrency: usize,
    /// Records accumulated from the source before one dispatch cycle
    pub batch_size: usize,
    /// Maximum users per outbound request
    pub batch_concurrent_limit: usize,
    /// Pause after each full macro-batch before ingestion resumes
    pub batch_pause_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::CONCURRENCY,
            batch_size: defaults::BATCH_SIZE,
            batch_concurrent_limit: defaults::BATCH_CONCURRENT_LIMIT,
            batch_pause_ms: defaults::BATCH_PAUSE_MS,
        }
    }
}

impl BatchConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Retry configuration for outbound requests
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    pub attempts: u32,
    /// Delay between attempts when no rate-limit hint is given
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: defaults::RETRY_ATTEMPTS,
            delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Output artifact configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; each run writes into a timestamped subdirectory
    pub output_dir: PathBuf,
    pub error_log_dir: PathBuf,
    /// Programme id stamped onto every migrated wallet
    pub loyalty_programme_id: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            error_log_dir: PathBuf::from(defaults::ERROR_LOG_DIR),
            loyalty_programme_id: String::new(),
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    /// Mirror console logs into a JSON file under `log_dir`
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(defaults::LOG_DIR),
            file_output: true,
        }
    }
}

impl MigrationConfig {
    /// Validate the loaded configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.host.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "api.host",
                "api configuration",
            ));
        }

        if self.api.authorization.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "api.authorization",
                "api configuration",
            ));
        }

        let positive_counts = [
            ("batch.concurrency", self.batch.concurrency),
            ("batch.batch_size", self.batch.batch_size),
            ("batch.batch_concurrent_limit", self.batch.batch_concurrent_limit),
        ];
        for (field, value) in positive_counts {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "value must be greater than 0",
                ));
            }
        }

        if self.retry.attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.attempts",
                "0",
                "at least one attempt is required",
            ));
        }

        Ok(())
    }

    /// Configuration as JSON with the credential masked, for logging
    pub fn sanitized(&self) -> serde_json::Value {
        let mut value = serde_json::json!(self);
        if let Some(api) = value.get_mut("api").and_then(|api| api.as_object_mut()) {
            api.insert(
                "authorization".to_string(),
                serde_json::Value::String(mask_secret(&self.api.authorization)),
            );
        }
        value
    }
}

/// Show only the first and last two characters of a secret
fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "[EMPTY]".to_string()
    } else if secret.chars().count() > 4 {
        let chars: Vec<char> = secret.chars().collect();
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("[MASKED: {head}***{tail}]")
    } else {
        "[MASKED: ***]".to_string()
    }
}
