//! End-to-end pipeline behaviour against a scripted loyalty API.

mod common;

use common::*;
use loyalty_migrator::{
    CsvRecordSource, JsonFileErrorLog, MemoryErrorLog, OutputWriter, PipelineDriver,
    VecRecordSource,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_three_users_two_dispatches() {
    let api = Arc::new(MockLoyaltyApi::new());
    let driver = PipelineDriver::from_config(
        &test_config(5, 2, 2),
        api.clone(),
        Arc::new(MemoryErrorLog::new()),
    );

    let result = driver.run(&mut VecRecordSource::new(records(3))).await;

    assert_eq!(result.successful.len(), 3);
    assert_eq!(result.failed.len(), 0);
    assert_eq!(result.total_processed, 3);
    assert_eq!(api.request_sizes(), vec![2, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_status_500_isolated_to_its_sub_group() {
    let api = Arc::new(MockLoyaltyApi::new().with_failing_id("user-3"));
    let driver = PipelineDriver::from_config(
        &test_config(5, 4, 2),
        api.clone(),
        Arc::new(MemoryErrorLog::new()),
    );

    let result = driver.run(&mut VecRecordSource::new(records(4))).await;

    let ids = |users: &[loyalty_migrator::UserResult]| {
        users
            .iter()
            .map(|r| r.loyalty_user_id.clone())
            .collect::<Vec<_>>()
    };
    let successful = ids(&result.successful);
    let failed = ids(&result.failed);
    assert_eq!(successful, vec!["user-1", "user-2"]);
    assert_eq!(failed, vec!["user-3", "user-4"]);
    for user in &result.failed {
        assert_eq!(
            user.error.as_deref(),
            Some("Loyalty API returned status code 500")
        );
        assert!(user.balances.is_zero());
        assert!(user.point_allocations.is_empty());
    }
    // A decoded non-success body is not retried
    assert_eq!(api.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_requests_never_exceed_cap() {
    for (concurrency, batch_size, sub_group) in [(1, 10, 2), (3, 20, 2), (4, 7, 1), (2, 100, 5)] {
        let api = Arc::new(MockLoyaltyApi::new().with_latency(Duration::from_millis(200)));
        let driver = PipelineDriver::from_config(
            &test_config(concurrency, batch_size, sub_group),
            api.clone(),
            Arc::new(MemoryErrorLog::new()),
        );

        let result = driver.run(&mut VecRecordSource::new(records(43))).await;

        assert_eq!(result.total_processed, 43);
        assert_eq!(result.successful.len(), 43);
        assert!(
            api.max_in_flight() <= concurrency,
            "observed {} in flight with cap {concurrency}",
            api.max_in_flight()
        );
        assert!(api.max_in_flight() >= 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_success() {
    let api = Arc::new(MockLoyaltyApi::new().with_script([
        Reply::Http {
            status: 503,
            headers: vec![],
        },
        Reply::Transport("connection reset"),
        Reply::Success,
    ]));
    let error_log = Arc::new(MemoryErrorLog::new());
    let driver = PipelineDriver::from_config(&test_config(1, 10, 10), api.clone(), error_log.clone());

    let result = driver.run(&mut VecRecordSource::new(records(3))).await;

    assert_eq!(api.request_count(), 3);
    assert_eq!(result.successful.len(), 3);
    assert!(result.successful.iter().all(|r| r.error.is_none()));
    assert!(error_log.entries().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_fail_every_user_once_logged() {
    let failure = Reply::Http {
        status: 502,
        headers: vec![],
    };
    let api = Arc::new(MockLoyaltyApi::new().with_script(vec![failure; 6]));
    let error_log = Arc::new(MemoryErrorLog::new());
    let driver = PipelineDriver::from_config(&test_config(1, 4, 2), api.clone(), error_log.clone());

    let result = driver.run(&mut VecRecordSource::new(records(4))).await;

    assert_eq!(api.request_count(), 6);
    assert!(result.successful.is_empty());
    assert_eq!(result.failed.len(), 4);
    for user in &result.failed {
        assert_eq!(
            user.error.as_deref(),
            Some("Request failed after all retry attempts")
        );
        assert!(user.balances.is_zero());
    }

    let entries = error_log.entries().await;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.attempt == 3));
    assert!(entries
        .iter()
        .all(|e| e.details.as_ref().map(|d| d.status) == Some(502)));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_waits_for_retry_after() {
    let api = Arc::new(
        MockLoyaltyApi::new()
            .with_latency(Duration::ZERO)
            .with_script([Reply::Http {
                status: 429,
                headers: vec![("retry-after", "2")],
            }]),
    );
    let driver = PipelineDriver::from_config(
        &test_config(1, 10, 10),
        api.clone(),
        Arc::new(MemoryErrorLog::new()),
    );

    let result = driver.run(&mut VecRecordSource::new(records(2))).await;
    assert_eq!(result.successful.len(), 2);

    let times = api.request_times();
    assert_eq!(times.len(), 2);
    let waited = times[1] - times[0];
    assert!(waited >= Duration::from_millis(2_000), "waited {waited:?}");
    assert!(waited < Duration::from_millis(2_050), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_totals_and_allocation_properties() {
    let api = Arc::new(MockLoyaltyApi::new().with_failing_id("user-7"));
    let driver = PipelineDriver::from_config(
        &test_config(3, 6, 3),
        api.clone(),
        Arc::new(MemoryErrorLog::new()),
    );

    let result = driver.run(&mut VecRecordSource::new(records(20))).await;

    assert_eq!(
        result.total_processed,
        result.successful.len() + result.failed.len()
    );
    assert_eq!(result.failed.len(), 3);

    for user in &result.successful {
        assert_eq!(
            user.point_allocations.len(),
            expiry_entries_for(&user.loyalty_user_id)
        );
        assert_eq!(
            user.is_multiple_points_expiry,
            !user.point_allocations.is_empty()
        );
        assert_eq!(user.balances.current_balance, 100.0);
        assert_eq!(user.balances.lifetime_earned_points, 250.0);
        for allocation in &user.point_allocations {
            assert_eq!(allocation.points, 100.0);
            assert_eq!(allocation.remaining_points, allocation.points);
            assert_eq!(allocation.wallet_id, user.id);
            assert_eq!(allocation.audit.loyalty_user_id, user.loyalty_user_id);
        }
    }
    for user in &result.failed {
        assert!(user.balances.is_zero());
        assert!(user.error.as_deref().is_some_and(|e| !e.is_empty()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_identical_responses_derive_identical_values() {
    let config = test_config(2, 5, 5);
    let first = PipelineDriver::from_config(
        &config,
        Arc::new(MockLoyaltyApi::new()),
        Arc::new(MemoryErrorLog::new()),
    )
    .run(&mut VecRecordSource::new(records(5)))
    .await;
    let second = PipelineDriver::from_config(
        &config,
        Arc::new(MockLoyaltyApi::new()),
        Arc::new(MemoryErrorLog::new()),
    )
    .run(&mut VecRecordSource::new(records(5)))
    .await;

    for (a, b) in first.successful.iter().zip(&second.successful) {
        assert_eq!(a.loyalty_user_id, b.loyalty_user_id);
        assert_eq!(a.balances, b.balances);
        assert_eq!(a.point_allocations.len(), b.point_allocations.len());
        assert_ne!(a.id, b.id);
    }
}

#[tokio::test(start_paused = true)]
async fn test_csv_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("users.csv");
    let mut file = std::fs::File::create(&input).unwrap();
    writeln!(file, "loyalty_user_id,current_tier,created_at,updated_at,email").unwrap();
    writeln!(file, "user-1,gold,2023-01-01,2023-02-01,a@example.com").unwrap();
    writeln!(file, "user-2,silver,2023-01-02,2023-02-02,b@example.com").unwrap();
    writeln!(file, "user-3,bronze,2023-01-03,2023-02-03,c@example.com").unwrap();
    drop(file);

    let mut config = test_config(2, 2, 2);
    config.output.output_dir = dir.path().join("output");
    config.output.error_log_dir = dir.path().join("error_logs");
    config.output.loyalty_programme_id = "programme-9".to_string();

    let api = Arc::new(MockLoyaltyApi::new().with_failing_id("user-3"));
    let error_log = Arc::new(JsonFileErrorLog::for_run(&config.output.error_log_dir));
    let driver = PipelineDriver::from_config(&config, api, error_log.clone());

    let mut source = CsvRecordSource::open(&input).unwrap();
    let result = driver.run(&mut source).await;

    assert_eq!(result.total_processed, 3);
    assert_eq!(result.successful.len(), 2);
    assert_eq!(result.successful[0].current_tier_id, "gold");
    assert_eq!(result.successful[0].loyalty_programme_id, "programme-9");
    assert_eq!(result.successful[1].created_at, "2023-01-02");

    let written = OutputWriter::new(&config.output.output_dir)
        .write(&result)
        .await
        .unwrap();
    assert!(written.iter().any(|p| p.ends_with("wallets.json")));
    assert!(written.iter().any(|p| p.ends_with("failed_users_logs.json")));

    // Non-success status codes are mapped, not retried, so nothing is logged
    assert!(error_log.is_empty().await);
    assert!(!error_log.path().exists());
}
