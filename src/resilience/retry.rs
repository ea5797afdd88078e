//! # Retry Executor
//!
//! Wraps a single outbound call with bounded retries. Rate-limited failures
//! wait for the server-provided `Retry-After` hint; every other failure waits
//! the configured base delay. Exhausting all attempts records the failure in
//! the injected [`ErrorLogSink`] and yields a [`TerminalFailure`] value, so
//! callers never see the underlying error type.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::error_log::{ErrorLogEntry, ErrorLogSink, HttpErrorDetails};
use crate::config::RetryConfig;
use crate::constants::messages;

/// Errors the retry executor knows how to back off from
pub trait RetryableError: fmt::Display + Send + Sync {
    /// Server-provided wait before the next attempt, for rate-limit responses
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// HTTP response details, for HTTP-shaped errors
    fn http_details(&self) -> Option<HttpErrorDetails> {
        None
    }
}

/// Failure after every attempt was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalFailure {
    pub message: String,
    /// Rendering of the last underlying error
    pub details: Option<String>,
    pub attempts: u32,
}

impl fmt::Display for TerminalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{} ({details})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Attempt budget and fallback delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.attempts,
            base_delay: config.base_delay(),
        }
    }
}

/// Bounded retry around one unit of work
///
/// Backoff is a plain `tokio::time::sleep`, so a waiting executor holds no
/// lock and never blocks sibling executors.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    error_log: Arc<dyn ErrorLogSink>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, error_log: Arc<dyn ErrorLogSink>) -> Self {
        Self { policy, error_log }
    }

    /// Run `operation` until it succeeds or the attempt budget is spent
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, TerminalFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, max_attempts, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt == max_attempts => {
                    self.record_terminal_failure(attempt, &err).await;
                    return Err(TerminalFailure {
                        message: messages::RETRIES_EXHAUSTED.to_string(),
                        details: Some(err.to_string()),
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    let delay = self.backoff_for(&err);
                    if err.retry_after().is_some() {
                        warn!(
                            error = %err,
                            wait_ms = delay.as_millis() as u64,
                            next_attempt = attempt + 1,
                            max_attempts,
                            "Rate limited, waiting before retry"
                        );
                    } else {
                        warn!(
                            error = %err,
                            attempt,
                            max_attempts,
                            wait_ms = delay.as_millis() as u64,
                            "Request failed, retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(TerminalFailure {
            message: messages::UNEXPECTED_END_OF_RETRY_LOOP.to_string(),
            details: None,
            attempts: max_attempts,
        })
    }

    /// Delay before the attempt following `err`
    pub fn backoff_for<E: RetryableError>(&self, err: &E) -> Duration {
        err.retry_after().unwrap_or(self.policy.base_delay)
    }

    async fn record_terminal_failure<E: RetryableError>(&self, attempt: u32, err: &E) {
        let details = err.http_details();
        error!(
            error = %err,
            attempts = attempt,
            status = details.as_ref().map(|d| d.status),
            "❌ Request failed after all retry attempts"
        );

        let entry = ErrorLogEntry::new(attempt, err.to_string(), details);
        if let Err(log_err) = self.error_log.append(entry).await {
            error!(error = %log_err, "Failed to write terminal failure to error log");
        }
    }
}
