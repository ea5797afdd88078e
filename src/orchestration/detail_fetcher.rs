//! # Detail Fetcher
//!
//! Resolves one sub-group of users with a single loyalty API call and maps the
//! response back onto each user. Every outcome is a per-user [`UserResult`]:
//! terminal request failures, non-success status codes, missing matches and
//! even panics during mapping become failed results for the affected users.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::transform::apply_customer;
use crate::client::LoyaltyApi;
use crate::constants::api::SUCCESS_STATUS_CODES;
use crate::constants::messages;
use crate::models::{Customer, CustomerDetailsResponse, RawUserRecord, UserResult};
use crate::resilience::RetryExecutor;

pub struct DetailFetcher {
    api: Arc<dyn LoyaltyApi>,
    retry: RetryExecutor,
    loyalty_programme_id: String,
}

impl std::fmt::Debug for DetailFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailFetcher")
            .field("retry", &self.retry)
            .field("loyalty_programme_id", &self.loyalty_programme_id)
            .finish_non_exhaustive()
    }
}

impl DetailFetcher {
    pub fn new(
        api: Arc<dyn LoyaltyApi>,
        retry: RetryExecutor,
        loyalty_programme_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            retry,
            loyalty_programme_id: loyalty_programme_id.into(),
        }
    }

    /// Resolve every user in `users` with one request
    ///
    /// Never fails: the returned vector always holds exactly one result per
    /// input user, in input order.
    pub async fn fetch(&self, users: &[RawUserRecord]) -> Vec<UserResult> {
        match AssertUnwindSafe(self.fetch_group(users)).catch_unwind().await {
            Ok(results) => results,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(
                    users = users.len(),
                    error = %reason,
                    "❌ Failed to fetch details for batch"
                );
                self.fail_all(
                    users,
                    &format!("{}: {reason}", messages::BATCH_REQUEST_FAILED),
                )
            }
        }
    }

    async fn fetch_group(&self, users: &[RawUserRecord]) -> Vec<UserResult> {
        let external_ids: Vec<String> = users
            .iter()
            .map(|user| user.loyalty_user_id.clone())
            .collect();
        let api = &self.api;
        let ids = &external_ids;

        match self.retry.execute(|| api.fetch_customers(ids)).await {
            Ok(response) => self.map_response(users, &response),
            Err(failure) => {
                warn!(
                    users = users.len(),
                    attempts = failure.attempts,
                    error = %failure,
                    "Sub-group failed after retries"
                );
                self.fail_all(users, &failure.message)
            }
        }
    }

    /// Map a decoded response onto the requested users
    pub fn map_response(
        &self,
        users: &[RawUserRecord],
        response: &CustomerDetailsResponse,
    ) -> Vec<UserResult> {
        let customers = &response.response.customers.customer;
        let code = response.response.status.code();

        if !code.is_some_and(|code| SUCCESS_STATUS_CODES.contains(&code)) {
            let message = match code {
                Some(code) => format!("Loyalty API returned status code {code}"),
                None => "Loyalty API returned no status code".to_string(),
            };
            warn!(users = users.len(), status_code = code, "{message}");
            return users
                .iter()
                .map(|user| {
                    self.failed(user, &message)
                        .with_customer(find_customer(customers, user).and_then(customer_value))
                })
                .collect();
        }

        let results: Vec<UserResult> = users
            .iter()
            .map(|user| self.map_user(user, customers))
            .collect();

        debug!(
            users = users.len(),
            matched = results.iter().filter(|r| r.success).count(),
            "Mapped customer details"
        );
        results
    }

    fn map_user(&self, user: &RawUserRecord, customers: &[Customer]) -> UserResult {
        let Some(customer) = find_customer(customers, user) else {
            return self.failed(user, messages::CUSTOMER_NOT_FOUND);
        };

        if !customer.item_status.is_success() {
            let message = customer
                .item_status
                .message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .unwrap_or(messages::CUSTOMER_LOOKUP_UNSUCCESSFUL);
            return self
                .failed(user, message)
                .with_customer(customer_value(customer));
        }

        apply_customer(UserResult::pending(user, &self.loyalty_programme_id), customer)
    }

    fn failed(&self, user: &RawUserRecord, message: &str) -> UserResult {
        UserResult::failed(user, &self.loyalty_programme_id, message)
    }

    pub(crate) fn fail_all(&self, users: &[RawUserRecord], message: &str) -> Vec<UserResult> {
        users.iter().map(|user| self.failed(user, message)).collect()
    }
}

fn find_customer<'a>(customers: &'a [Customer], user: &RawUserRecord) -> Option<&'a Customer> {
    customers
        .iter()
        .find(|customer| customer.external_id == user.loyalty_user_id)
}

fn customer_value(customer: &Customer) -> Option<serde_json::Value> {
    serde_json::to_value(customer).ok()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown error".to_string()
    }
}
