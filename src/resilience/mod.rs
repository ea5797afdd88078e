//! # Resilience Module
//!
//! Failure handling for outbound requests.
//!
//! - **Retry Executor**: bounded retries with rate-limit-aware backoff
//! - **Error Log**: append-only record of requests that exhausted their retries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use loyalty_migrator::resilience::{JsonFileErrorLog, RetryExecutor, RetryPolicy};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let error_log = Arc::new(JsonFileErrorLog::for_run("error_logs"));
//! let executor = RetryExecutor::new(RetryPolicy::default(), error_log);
//! # }
//! ```

pub mod error_log;
pub mod retry;

pub use error_log::{
    ErrorLogEntry, ErrorLogSink, HttpErrorDetails, JsonFileErrorLog, MemoryErrorLog,
};
pub use retry::{RetryExecutor, RetryPolicy, RetryableError, TerminalFailure};
