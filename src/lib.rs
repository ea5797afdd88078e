#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Loyalty Migrator
//!
//! Bounded-concurrency migration of loyalty users from a CSV export into the
//! wallet/points model.
//!
//! ## Overview
//!
//! Each source row names a loyalty user. Rows are accumulated into
//! macro-batches, split into sub-groups, and each sub-group is resolved with a
//! single call to the customer details API. The response is turned into a
//! wallet with point balances, one point allocation per expiry-schedule entry
//! and an audit record per allocation.
//!
//! ## Architecture
//!
//! ```text
//! RecordSource -> PipelineDriver -> BatchCoordinator -> DetailFetcher -> RetryExecutor -> LoyaltyApi
//! ```
//!
//! - **Per-user failure isolation**: retries exhausted, missing matches and
//!   unsuccessful lookups become failed [`UserResult`]s; they never abort a run
//! - **Run-wide concurrency cap**: one semaphore bounds in-flight requests
//!   across every macro-batch
//! - **Rate-limit aware retries**: `429` responses wait for `Retry-After`
//! - **Pacing**: a fixed pause after every full macro-batch
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (defaults, file, environment, CLI)
//! - [`source`] - Record sources, including the CSV reader
//! - [`client`] - Loyalty API trait and HTTP client
//! - [`resilience`] - Retry executor and terminal-failure error log
//! - [`orchestration`] - Detail fetcher, batch coordinator, pipeline driver
//! - [`output`] - JSON artifact writer
//! - [`models`] - Records, API payloads and derived wallet data
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use loyalty_migrator::{
//!     ConfigManager, ConfigOverrides, CsvRecordSource, JsonFileErrorLog, LoyaltyApiClient,
//!     OutputWriter, PipelineDriver,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let overrides = ConfigOverrides {
//!     authorization: Some("Basic c2VjcmV0".to_string()),
//!     ..Default::default()
//! };
//! let manager = ConfigManager::load(None, &overrides)?;
//! let config = manager.config();
//!
//! let api = Arc::new(LoyaltyApiClient::new(&config.api)?);
//! let error_log = Arc::new(JsonFileErrorLog::for_run(&config.output.error_log_dir));
//! let driver = PipelineDriver::from_config(config, api, error_log);
//!
//! let mut source = CsvRecordSource::open("users.csv")?;
//! let result = driver.run(&mut source).await;
//! OutputWriter::new(&config.output.output_dir).write(&result).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod output;
pub mod resilience;
pub mod source;
pub mod utils;

pub use client::{ApiError, LoyaltyApi, LoyaltyApiClient};
pub use config::{ConfigManager, ConfigOverrides, ConfigurationError, MigrationConfig};
pub use error::{MigrationError, Result};
pub use models::{
    PointAllocation, ProcessingResult, RawUserRecord, TransactionAudit, UserResult, UserWallet,
};
pub use orchestration::{BatchCoordinator, DetailFetcher, PipelineDriver};
pub use output::OutputWriter;
pub use resilience::{
    ErrorLogSink, JsonFileErrorLog, MemoryErrorLog, RetryExecutor, RetryPolicy, TerminalFailure,
};
pub use source::{CsvRecordSource, RecordSource, VecRecordSource};
