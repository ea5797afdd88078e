//! # Loyalty API Trait
//!
//! The seam between the orchestration layer and the upstream loyalty service.
//! Production code uses [`LoyaltyApiClient`](super::LoyaltyApiClient); tests and
//! dry runs plug in scripted implementations.

use async_trait::async_trait;

use super::error::ApiError;
use crate::models::CustomerDetailsResponse;

#[async_trait]
pub trait LoyaltyApi: Send + Sync {
    /// Resolve loyalty details for every external id in one request
    async fn fetch_customers(
        &self,
        external_ids: &[String],
    ) -> Result<CustomerDetailsResponse, ApiError>;
}
