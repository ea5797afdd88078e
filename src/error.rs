//! # Migration Error Types
//!
//! Crate-wide error handling for startup, configuration and input failures.
//!
//! Per-user and per-request failures never surface here: they are recorded as
//! failed [`UserResult`](crate::models::UserResult) values by the orchestration
//! layer so a single bad request cannot abort a run.

use crate::config::ConfigurationError;
use thiserror::Error;

/// Migration result type
pub type Result<T> = std::result::Result<T, MigrationError>;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrationError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an input validation error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<ConfigurationError> for MigrationError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MigrationError::invalid_input("Please provide a CSV file");
        assert_eq!(err.to_string(), "Invalid input: Please provide a CSV file");

        let err = MigrationError::configuration("batch.concurrency must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: batch.concurrency must be at least 1"
        );
    }

    #[test]
    fn test_configuration_errors_convert() {
        let err: MigrationError =
            ConfigurationError::missing_required_field("api.authorization", "api configuration")
                .into();
        assert!(matches!(err, MigrationError::Configuration(_)));
        assert!(err.to_string().contains("api.authorization"));
    }
}
