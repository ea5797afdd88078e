//! Aggregate result of a migration run.

use serde::Serialize;

use super::user_result::{PointAllocationRecord, TransactionAudit, UserResult, UserWallet};

/// Successful and failed partitions of a run, in append order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingResult {
    pub successful: Vec<UserResult>,
    pub failed: Vec<UserResult>,
    /// Records dispatched to the loyalty API
    pub total_processed: usize,
    /// Source rows that could not be read and were never dispatched
    pub skipped_records: usize,
}

impl ProcessingResult {
    /// Partition results by success flag, keeping their relative order
    pub fn from_results(
        results: Vec<UserResult>,
        total_processed: usize,
        skipped_records: usize,
    ) -> Self {
        let (successful, failed) = results.into_iter().partition(|result| result.success);
        Self {
            successful,
            failed,
            total_processed,
            skipped_records,
        }
    }

    pub fn wallets(&self) -> Vec<UserWallet> {
        self.successful.iter().map(UserWallet::from).collect()
    }

    pub fn point_allocations(&self) -> Vec<PointAllocationRecord> {
        self.successful
            .iter()
            .flat_map(|result| result.point_allocations.iter())
            .map(PointAllocationRecord::from)
            .collect()
    }

    pub fn transaction_audits(&self) -> Vec<TransactionAudit> {
        self.successful
            .iter()
            .flat_map(|result| result.point_allocations.iter())
            .map(|allocation| allocation.audit.clone())
            .collect()
    }
}
