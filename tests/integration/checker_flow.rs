//! End-to-end checker flows over the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_health::{Check, HealthCheckerBuilder, Status};

#[tokio::test]
async fn test_two_healthy_checks_report_up() {
    let checker = HealthCheckerBuilder::new()
        .check(Check::new("database", || async { Ok(()) }))
        .check(Check::new("broker", || async { Ok(()) }))
        .build()
        .unwrap();

    let result = checker.check().await;

    assert_eq!(result.status, Status::Up);
    let details = result.details.expect("details must be present");
    assert_eq!(details.len(), 2);
    for name in ["database", "broker"] {
        assert_eq!(details[name].status, Status::Up);
        assert!(details[name].timestamp.is_some());
        assert!(details[name].error.is_none());
    }
}

#[tokio::test]
async fn test_one_failing_check_reports_down() {
    let checker = HealthCheckerBuilder::new()
        .check(Check::new("database", || async { Ok(()) }))
        .check(Check::new("broker", || async { Err(anyhow::anyhow!("boom")) }))
        .build()
        .unwrap();

    let result = checker.check().await;

    assert_eq!(result.status, Status::Down);
    let details = result.details.expect("details must be present");
    assert_eq!(details["database"].status, Status::Up);
    assert_eq!(details["broker"].status, Status::Down);
    assert_eq!(details["broker"].error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_slow_probe_reports_timeout() {
    let checker = HealthCheckerBuilder::new()
        .check(
            Check::new("slow", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .with_timeout(Duration::from_millis(10)),
        )
        .build()
        .unwrap();

    let result = checker.check().await;

    assert_eq!(result.status, Status::Down);
    let details = result.details.expect("details must be present");
    assert_eq!(details["slow"].error.as_deref(), Some("check timed out"));
}

#[tokio::test]
async fn test_tolerance_suppresses_down_until_thresholds_crossed() {
    // First failure is tolerated (fails == threshold); the second crosses
    // the strict inequality and reports Down.
    let checker = HealthCheckerBuilder::new()
        .disabled_cache()
        .check(
            Check::new("flaky", || async { Err(anyhow::anyhow!("boom")) })
                .with_max_consecutive_fails(1)
                .with_max_time_in_error(Duration::ZERO),
        )
        .build()
        .unwrap();

    let first = checker.check().await;
    assert_eq!(first.status, Status::Up);

    let second = checker.check().await;
    assert_eq!(second.status, Status::Down);
}

#[tokio::test]
async fn test_cached_result_skips_probe_execution() {
    let executions = Arc::new(AtomicUsize::new(0));
    let probe_executions = Arc::clone(&executions);

    let checker = HealthCheckerBuilder::new()
        .cache_duration(Duration::from_secs(60))
        .check(Check::new("counted", move || {
            let executions = Arc::clone(&probe_executions);
            async move {
                executions.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }))
        .build()
        .unwrap();

    let first = checker.check().await;
    let second = checker.check().await;

    assert_eq!(first, second);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_error_text_is_truncated() {
    let checker = HealthCheckerBuilder::new()
        .max_error_message_length(4)
        .check(Check::new("wordy", || async {
            Err(anyhow::anyhow!("this is nice"))
        }))
        .build()
        .unwrap();

    let result = checker.check().await;

    let details = result.details.expect("details must be present");
    assert_eq!(details["wordy"].error.as_deref(), Some("this"));
}
