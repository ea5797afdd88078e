#![allow(dead_code)]

pub mod mock_loyalty_api;

pub use mock_loyalty_api::*;

use loyalty_migrator::{MigrationConfig, RawUserRecord};

pub fn records(count: usize) -> Vec<RawUserRecord> {
    (1..=count)
        .map(|i| RawUserRecord::new(format!("user-{i}")))
        .collect()
}

/// Test configuration with small, explicit knobs
pub fn test_config(
    concurrency: usize,
    batch_size: usize,
    batch_concurrent_limit: usize,
) -> MigrationConfig {
    let mut config = MigrationConfig::default();
    config.api.authorization = "Basic dGVzdA==".to_string();
    config.batch.concurrency = concurrency;
    config.batch.batch_size = batch_size;
    config.batch.batch_concurrent_limit = batch_concurrent_limit;
    config.batch.batch_pause_ms = 100;
    config.retry.attempts = 3;
    config.retry.delay_ms = 100;
    config
}
