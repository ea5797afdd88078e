//! # Loyalty API Error Types
//!
//! Errors raised at the HTTP boundary. They exist only between the client and
//! the retry executor; everything above sees a [`TerminalFailure`] value.
//!
//! [`TerminalFailure`]: crate::resilience::TerminalFailure

use reqwest::header::HeaderMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::constants::api::{RATE_LIMIT_STATUS, RETRY_AFTER_HEADER};
use crate::resilience::{HttpErrorDetails, RetryableError};

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Request failed with status code {status}")]
    Http {
        status: u16,
        body: Value,
        headers: BTreeMap<String, String>,
        retry_after: Option<Duration>,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response format: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build an HTTP error, reading the `Retry-After` hint from the headers
    pub fn http(status: u16, body: Value, headers: BTreeMap<String, String>) -> Self {
        let retry_after = headers
            .get(RETRY_AFTER_HEADER)
            .and_then(|value| parse_retry_after(value));
        Self::Http {
            status,
            body,
            headers,
            retry_after,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl RetryableError for ApiError {
    fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::Http {
                status,
                retry_after,
                ..
            } if *status == RATE_LIMIT_STATUS => *retry_after,
            _ => None,
        }
    }

    fn http_details(&self) -> Option<HttpErrorDetails> {
        match self {
            ApiError::Http {
                status,
                body,
                headers,
                ..
            } => Some(HttpErrorDetails {
                status: *status,
                data: body.clone(),
                headers: headers.clone(),
            }),
            _ => None,
        }
    }
}

/// `Retry-After` as whole seconds; HTTP-date values are not honoured
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Flatten response headers into a sorted, lower-cased map
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
