//! # Terminal Failure Error Log
//!
//! Append-only record of requests that exhausted their retries. The sink is an
//! injected dependency of the retry executor; implementations must tolerate
//! concurrent appends from many in-flight sub-groups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

/// HTTP response captured for an error that carried one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpErrorDetails {
    pub status: u16,
    /// Response body, parsed as JSON when possible
    pub data: Value,
    pub headers: BTreeMap<String, String>,
}

/// One terminal failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    /// Attempt number on which the request finally failed
    pub attempt: u32,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HttpErrorDetails>,
}

impl ErrorLogEntry {
    pub fn new(attempt: u32, error: impl Into<String>, details: Option<HttpErrorDetails>) -> Self {
        Self {
            timestamp: Utc::now(),
            attempt,
            error: error.into(),
            details,
        }
    }
}

/// Destination for terminal failure records
#[async_trait]
pub trait ErrorLogSink: Send + Sync {
    async fn append(&self, entry: ErrorLogEntry) -> Result<()>;
}

/// JSON array file holding every terminal failure of one run
///
/// Entries are kept in memory behind a mutex and the whole array is rewritten
/// on each append, so concurrent failures are serialized and the file is
/// always a complete JSON document.
///
/// Rewriting makes each append linear in the entries so far. At one entry per
/// exhausted sub-group that stays small; a run expecting thousands of terminal
/// failures would want a line-delimited format instead.
#[derive(Debug)]
pub struct JsonFileErrorLog {
    path: PathBuf,
    entries: Mutex<Vec<ErrorLogEntry>>,
}

impl JsonFileErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Log file for a run started now: `<dir>/errors_<unix_ms>.json`
    pub fn for_run(error_log_dir: impl AsRef<Path>) -> Self {
        let file_name = format!("errors_{}.json", Utc::now().timestamp_millis());
        Self::new(error_log_dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl ErrorLogSink for JsonFileErrorLog {
    async fn append(&self, entry: ErrorLogEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(&*entries)?;
        tokio::fs::write(&self.path, contents).await?;

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Appended terminal failure to error log"
        );
        Ok(())
    }
}

/// In-memory sink, for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryErrorLog {
    entries: Mutex<Vec<ErrorLogEntry>>,
}

impl MemoryErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<ErrorLogEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl ErrorLogSink for MemoryErrorLog {
    async fn append(&self, entry: ErrorLogEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
