//! # Batch Coordinator
//!
//! Splits a macro-batch into sub-groups and runs each through the
//! [`DetailFetcher`] on its own task. A semaphore shared by the whole run caps
//! how many sub-groups are in flight at once; sub-groups beyond the cap wait
//! for a permit. Results are concatenated in sub-group order.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use super::detail_fetcher::DetailFetcher;
use crate::constants::messages;
use crate::models::{RawUserRecord, UserResult};

#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    fetcher: Arc<DetailFetcher>,
    /// Admission gate shared across every macro-batch of the run
    limiter: Arc<Semaphore>,
    concurrency: usize,
    sub_group_size: usize,
}

impl BatchCoordinator {
    pub fn new(fetcher: Arc<DetailFetcher>, concurrency: usize, sub_group_size: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            fetcher,
            limiter: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            sub_group_size: sub_group_size.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn sub_group_size(&self) -> usize {
        self.sub_group_size
    }

    /// Permits not currently held by an in-flight sub-group
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Process a whole macro-batch, one result per input user
    pub async fn process(&self, users: Vec<RawUserRecord>) -> Vec<UserResult> {
        let total = users.len();
        let groups = split_into_sub_groups(users, self.sub_group_size);
        debug!(
            users = total,
            sub_groups = groups.len(),
            available_permits = self.available_permits(),
            "Dispatching macro-batch"
        );

        let handles: Vec<_> = groups
            .iter()
            .map(|group| {
                let group = Arc::clone(group);
                let fetcher = Arc::clone(&self.fetcher);
                let limiter = Arc::clone(&self.limiter);
                tokio::spawn(async move {
                    let _permit = match limiter.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return fetcher.fail_all(
                                &group,
                                &format!("{}: {e}", messages::BATCH_REQUEST_FAILED),
                            )
                        }
                    };
                    fetcher.fetch(&group).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        let outcomes = join_all(handles).await;
        for (index, (outcome, group)) in outcomes.into_iter().zip(&groups).enumerate() {
            match outcome {
                Ok(group_results) => results.extend(group_results),
                Err(join_error) => {
                    error!(
                        sub_group = index,
                        users = group.len(),
                        error = %join_error,
                        "❌ Sub-group task did not complete"
                    );
                    results.extend(self.fetcher.fail_all(
                        group,
                        &format!("{}: {join_error}", messages::BATCH_REQUEST_FAILED),
                    ));
                }
            }
        }
        results
    }
}

/// Contiguous sub-groups of at most `size` users, in input order
pub fn split_into_sub_groups(
    users: Vec<RawUserRecord>,
    size: usize,
) -> Vec<Arc<Vec<RawUserRecord>>> {
    let size = size.max(1);
    let mut groups = Vec::with_capacity(users.len().div_ceil(size));
    let mut users = users.into_iter().peekable();
    while users.peek().is_some() {
        groups.push(Arc::new(users.by_ref().take(size).collect()));
    }
    groups
}
