//! # Structured Logging Module
//!
//! Environment-aware structured logging that writes human-readable output to
//! the console and, optionally, JSON lines into a per-run file under the
//! configured log directory.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{ConfigManager, LoggingConfig};

static LOGGER_INITIALIZED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; only the first call installs a subscriber.
/// Returns the JSON log file path when file output is active.
pub fn init_structured_logging(config: &LoggingConfig) -> Option<PathBuf> {
    LOGGER_INITIALIZED
        .get_or_init(|| {
            let environment = ConfigManager::detect_environment();
            let log_level = get_log_level(&environment);
            let pid = process::id();

            let file_target = if config.file_output {
                prepare_log_file(&config.log_dir, &environment, pid)
            } else {
                None
            };

            let console_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(env_filter(log_level));

            let (file_layer, guard) = match &file_target {
                Some((dir, file_name)) => {
                    let appender = tracing_appender::rolling::never(dir, file_name);
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    let layer = fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(env_filter(log_level));
                    (Some(layer), Some(guard))
                }
                None => (None, None),
            };

            let subscriber = tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer);

            // A subscriber installed by an embedding application wins
            if subscriber.try_init().is_err() {
                tracing::debug!(
                    "Global tracing subscriber already initialized - continuing with existing subscriber"
                );
            }

            let log_path = file_target.map(|(dir, file_name)| dir.join(file_name));
            tracing::info!(
                pid = pid,
                environment = %environment,
                log_file = log_path.as_ref().map(|p| p.display().to_string()),
                "🔧 STRUCTURED LOGGING: Initialized"
            );

            // The worker must outlive every log call
            if let Some(guard) = guard {
                std::mem::forget(guard);
            }
            log_path
        })
        .clone()
}

fn prepare_log_file(log_dir: &Path, environment: &str, pid: u32) -> Option<(PathBuf, String)> {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!(
            "Failed to create log directory {}: {e}; logging to console only",
            log_dir.display()
        );
        return None;
    }
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    Some((
        log_dir.to_path_buf(),
        format!("{environment}.{pid}.{timestamp}.log"),
    ))
}

/// `RUST_LOG` wins over the environment default
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for batch dispatch operations
pub fn log_batch_operation(
    operation: &str,
    batch_size: usize,
    processed: usize,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        batch_size = batch_size,
        processed = processed,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📦 BATCH_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
