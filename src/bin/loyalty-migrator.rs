//! # Loyalty Migrator
//!
//! Command-line entry point: validates the input file, loads configuration,
//! runs the migration pipeline, writes the artifacts and prints a summary.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use loyalty_migrator::config::{ConfigManager, ConfigOverrides};
use loyalty_migrator::logging::init_structured_logging;
use loyalty_migrator::source::validate_csv_path;
use loyalty_migrator::utils::format_execution_time;
use loyalty_migrator::{
    CsvRecordSource, JsonFileErrorLog, LoyaltyApiClient, OutputWriter, PipelineDriver,
};

#[derive(Parser, Debug)]
#[command(name = "loyalty-migrator")]
#[command(about = "Migrate loyalty users from a CSV export into wallets and point allocations")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// CSV export with a loyalty_user_id column
    #[arg(short, long)]
    input: PathBuf,

    /// Authorization header value for the loyalty API
    #[arg(short, long, env = "LOYALTY_MIGRATOR_AUTHORIZATION", hide_env_values = true)]
    authorization: Option<String>,

    /// Loyalty API host
    #[arg(long)]
    capillary_host: Option<String>,

    /// Maximum sub-group requests in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Records per macro-batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Users per outbound request
    #[arg(long)]
    batch_concurrent_limit: Option<usize>,

    /// Attempts per request, including the first
    #[arg(long)]
    retry_attempts: Option<u32>,

    /// Delay between attempts in milliseconds
    #[arg(long)]
    retry_delay: Option<u64>,

    /// Pause after each full macro-batch in milliseconds
    #[arg(long)]
    batch_pause_ms: Option<u64>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    error_log_dir: Option<PathBuf>,

    /// Optional configuration file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            authorization: self.authorization.clone(),
            host: self.capillary_host.clone(),
            concurrency: self.concurrency,
            batch_size: self.batch_size,
            batch_concurrent_limit: self.batch_concurrent_limit,
            batch_pause_ms: self.batch_pause_ms,
            retry_attempts: self.retry_attempts,
            retry_delay_ms: self.retry_delay,
            output_dir: self.output_dir.clone(),
            error_log_dir: self.error_log_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    validate_csv_path(&cli.input)?;

    let manager = ConfigManager::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    let config = manager.config();
    init_structured_logging(&config.logging);
    manager.log_summary();

    info!(
        environment = %manager.environment(),
        input = %cli.input.display(),
        config = %config.sanitized(),
        "🚀 Starting loyalty migration"
    );

    let started_at = Utc::now();
    let timer = Instant::now();

    let mut source = CsvRecordSource::open(&cli.input)
        .with_context(|| format!("Failed to open input file {}", cli.input.display()))?;
    let api = Arc::new(LoyaltyApiClient::new(&config.api)?);
    let error_log = Arc::new(JsonFileErrorLog::for_run(&config.output.error_log_dir));
    let driver = PipelineDriver::from_config(config, api, error_log.clone());

    let result = driver.run(&mut source).await;

    let written = match OutputWriter::new(&config.output.output_dir).write(&result).await {
        Ok(written) => written,
        Err(e) => {
            error!(error = %e, "❌ Failed to write migration artifacts");
            return Err(e).context("Failed to write migration artifacts");
        }
    };

    let ended_at = Utc::now();
    println!();
    println!("📊 Migration summary");
    println!("  Total processed:  {}", result.total_processed);
    println!("  Successful:       {}", result.successful.len());
    println!("  Failed:           {}", result.failed.len());
    println!("  Skipped rows:     {}", result.skipped_records);
    println!("  Started at:       {}", started_at.to_rfc3339());
    println!("  Ended at:         {}", ended_at.to_rfc3339());
    println!("  Execution time:   {}", format_execution_time(timer.elapsed()));
    if let Some(dir) = written.first().and_then(|path| path.parent()) {
        println!("  Output:           {}", dir.display());
    }
    if !error_log.is_empty().await {
        println!("  Error log:        {}", error_log.path().display());
    }

    Ok(())
}
