//! # Pipeline Driver
//!
//! Pulls records from a [`RecordSource`] into macro-batches and hands each
//! full batch to the [`BatchCoordinator`] by value, starting a fresh buffer
//! for the next one. After every full batch the driver pauses for the pacing
//! interval; the trailing partial batch is dispatched without a pause.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::batch_coordinator::BatchCoordinator;
use super::detail_fetcher::DetailFetcher;
use crate::client::LoyaltyApi;
use crate::config::MigrationConfig;
use crate::logging::{log_batch_operation, log_error};
use crate::models::{ProcessingResult, RawUserRecord, UserResult};
use crate::resilience::{ErrorLogSink, RetryExecutor, RetryPolicy};
use crate::source::RecordSource;

#[derive(Debug, Clone)]
pub struct PipelineDriver {
    coordinator: BatchCoordinator,
    batch_size: usize,
    batch_pause: Duration,
}

impl PipelineDriver {
    pub fn new(coordinator: BatchCoordinator, batch_size: usize, batch_pause: Duration) -> Self {
        Self {
            coordinator,
            batch_size: batch_size.max(1),
            batch_pause,
        }
    }

    /// Wire the full fetch stack from configuration
    pub fn from_config(
        config: &MigrationConfig,
        api: Arc<dyn LoyaltyApi>,
        error_log: Arc<dyn ErrorLogSink>,
    ) -> Self {
        let retry = RetryExecutor::new(RetryPolicy::from(&config.retry), error_log);
        let fetcher = Arc::new(DetailFetcher::new(
            api,
            retry,
            config.output.loyalty_programme_id.clone(),
        ));
        let coordinator = BatchCoordinator::new(
            fetcher,
            config.batch.concurrency,
            config.batch.batch_concurrent_limit,
        );
        Self::new(
            coordinator,
            config.batch.batch_size,
            config.batch.batch_pause(),
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Drain `source` and aggregate every per-user outcome
    ///
    /// Unreadable rows are logged and counted as skipped; they never reach
    /// the loyalty API.
    pub async fn run<S>(&self, source: &mut S) -> ProcessingResult
    where
        S: RecordSource + ?Sized,
    {
        let mut buffer: Vec<RawUserRecord> = Vec::with_capacity(self.batch_size);
        let mut results: Vec<UserResult> = Vec::new();
        let mut processed = 0usize;
        let mut skipped = 0usize;

        info!(
            batch_size = self.batch_size,
            sub_group_size = self.coordinator.sub_group_size(),
            concurrency = self.coordinator.concurrency(),
            "🚀 Starting migration pipeline"
        );

        while let Some(next) = source.next_record().await {
            match next {
                Ok(record) => buffer.push(record),
                Err(e) => {
                    skipped += 1;
                    log_error("pipeline", "read_record", &e.to_string(), None);
                    continue;
                }
            }

            if buffer.len() >= self.batch_size {
                let batch = std::mem::replace(&mut buffer, Vec::with_capacity(self.batch_size));
                processed += self.dispatch(batch, &mut results, processed).await;

                debug!(pause_ms = self.batch_pause.as_millis() as u64, "Pacing before next batch");
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        if !buffer.is_empty() {
            let batch = std::mem::take(&mut buffer);
            processed += self.dispatch(batch, &mut results, processed).await;
        }

        let result = ProcessingResult::from_results(results, processed, skipped);
        if skipped > 0 {
            warn!(skipped, "Some source rows could not be read and were skipped");
        }
        info!(
            total_processed = result.total_processed,
            successful = result.successful.len(),
            failed = result.failed.len(),
            skipped = result.skipped_records,
            "✅ Migration pipeline finished"
        );
        result
    }

    async fn dispatch(
        &self,
        batch: Vec<RawUserRecord>,
        results: &mut Vec<UserResult>,
        processed_before: usize,
    ) -> usize {
        let size = batch.len();
        let batch_results = self.coordinator.process(batch).await;
        let failed = batch_results.iter().filter(|r| !r.success).count();
        results.extend(batch_results);

        let details = format!("{failed} failed");
        log_batch_operation(
            "dispatch",
            size,
            processed_before + size,
            if failed == 0 { "completed" } else { "completed_with_failures" },
            Some(&details),
        );
        size
    }
}
