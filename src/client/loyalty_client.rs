//! # Loyalty API Client
//!
//! HTTP client for the customer details endpoint. One call resolves a whole
//! sub-group: the external ids are comma-joined into a single `external_id`
//! query parameter alongside the fixed detail flags.
//!
//! The client performs exactly one request per call. Retries, backoff and
//! error logging belong to [`RetryExecutor`](crate::resilience::RetryExecutor).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{header_map, ApiError};
use super::traits::LoyaltyApi;
use crate::config::ApiConfig;
use crate::constants::api::{CUSTOMER_DETAILS_PATH, DETAIL_QUERY_FLAGS};
use crate::error::{MigrationError, Result};
use crate::models::CustomerDetailsResponse;

/// reqwest-backed implementation of [`LoyaltyApi`]
#[derive(Clone)]
pub struct LoyaltyApiClient {
    client: Client,
    details_url: Url,
}

impl std::fmt::Debug for LoyaltyApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoyaltyApiClient")
            .field("details_url", &self.details_url.as_str())
            .field("authorization", &"[MASKED]")
            .finish()
    }
}

impl LoyaltyApiClient {
    /// Build a client from the API section of the configuration
    ///
    /// The host may be given bare (`api.example.com`, https is assumed) or with
    /// an explicit scheme, which tests use to point at a local listener.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let details_url = base_url(&config.host)?
            .join(CUSTOMER_DETAILS_PATH)
            .map_err(|e| MigrationError::configuration(format!("Failed to construct URL: {e}")))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut credential = HeaderValue::from_str(&config.authorization).map_err(|e| {
            MigrationError::configuration(format!("Invalid authorization header: {e}"))
        })?;
        credential.set_sensitive(true);
        default_headers.insert(AUTHORIZATION, credential);

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("loyalty-migrator/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .build()
            .map_err(|e| {
                MigrationError::configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            details_url,
        })
    }

    /// Full request URL for one sub-group of external ids
    pub fn details_url(&self, external_ids: &[String]) -> Url {
        let mut url = self.details_url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in DETAIL_QUERY_FLAGS {
                query.append_pair(key, value);
            }
            query.append_pair("external_id", &external_ids.join(","));
        }
        url
    }
}

fn base_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(MigrationError::configuration("API host must not be empty"));
    }
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    Url::parse(&raw).map_err(|e| MigrationError::configuration(format!("Invalid API host: {e}")))
}

#[async_trait]
impl LoyaltyApi for LoyaltyApiClient {
    async fn fetch_customers(
        &self,
        external_ids: &[String],
    ) -> std::result::Result<CustomerDetailsResponse, ApiError> {
        let url = self.details_url(external_ids);
        debug!(ids = external_ids.len(), "Requesting customer details");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<CustomerDetailsResponse>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()));
        }

        let headers = header_map(response.headers());
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        warn!(
            status = status.as_u16(),
            ids = external_ids.len(),
            "Loyalty API returned non-success status"
        );
        Err(ApiError::http(status.as_u16(), body, headers))
    }
}
