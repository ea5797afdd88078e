//! JSON artifact writer for a finished run.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::output;
use crate::error::Result;
use crate::models::ProcessingResult;

/// Writes run artifacts into `<output_dir>/<unix_ms>/`
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write every non-empty artifact into a fresh timestamped directory
    ///
    /// Returns the paths written, in a fixed order. Nothing is created when
    /// the run produced no results.
    pub async fn write(&self, result: &ProcessingResult) -> Result<Vec<PathBuf>> {
        let run_dir = self
            .output_dir
            .join(Utc::now().timestamp_millis().to_string());
        self.write_into(&run_dir, result).await
    }

    /// Like [`write`](Self::write), into an explicit directory
    pub async fn write_into(
        &self,
        run_dir: &Path,
        result: &ProcessingResult,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        write_artifact(run_dir, output::FAILED_USERS, &result.failed, &mut written).await?;
        write_artifact(
            run_dir,
            output::SUCCESSFUL_USERS,
            &result.successful,
            &mut written,
        )
        .await?;
        write_artifact(run_dir, output::WALLETS, &result.wallets(), &mut written).await?;
        write_artifact(
            run_dir,
            output::POINT_ALLOCATIONS,
            &result.point_allocations(),
            &mut written,
        )
        .await?;
        write_artifact(
            run_dir,
            output::TRANSACTION_AUDITS,
            &result.transaction_audits(),
            &mut written,
        )
        .await?;

        if !written.is_empty() {
            info!(
                directory = %run_dir.display(),
                files = written.len(),
                "📁 Wrote migration artifacts"
            );
        }
        Ok(written)
    }
}

async fn write_artifact<T: Serialize>(
    run_dir: &Path,
    file_name: &str,
    items: &[T],
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(run_dir).await?;
    let path = run_dir.join(file_name);
    let contents = serde_json::to_string_pretty(items)?;
    tokio::fs::write(&path, contents).await?;
    written.push(path);
    Ok(())
}
