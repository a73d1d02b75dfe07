//! Periodic check scheduling end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_health::{Check, HealthCheckerBuilder, Status};

fn counting_probe(counter: &Arc<AtomicUsize>) -> impl Fn() -> futures_util::future::BoxFuture<'static, anyhow::Result<()>> {
    let counter = Arc::clone(counter);
    move || {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_periodic_check_unknown_before_first_execution() {
    let checker = HealthCheckerBuilder::new()
        .periodic_check(
            Duration::from_secs(5 * 3600),
            Some(Duration::from_secs(3600)),
            Check::new("warehouse", || async { Ok(()) }),
        )
        .build()
        .unwrap();

    let result = checker.check().await;

    assert_eq!(result.status, Status::Unknown);
    let details = result.details.expect("details must be present");
    assert_eq!(details["warehouse"].status, Status::Unknown);
    assert!(details["warehouse"].timestamp.is_none());

    checker.stop().await;
}

#[tokio::test]
async fn test_manual_start_lifecycle() {
    let checker = HealthCheckerBuilder::new()
        .manual_periodic_check_start()
        .periodic_check(
            Duration::from_secs(50 * 60),
            None,
            Check::new("warehouse", || async { Ok(()) }),
        )
        .build()
        .unwrap();

    assert_eq!(checker.periodic_worker_count(), 0);
    assert!(!checker.is_started());

    checker.start();
    assert_eq!(checker.periodic_worker_count(), 1);
    assert!(checker.is_started());

    checker.stop().await;
    assert_eq!(checker.periodic_worker_count(), 0);
    assert!(!checker.is_started());
}

#[tokio::test]
async fn test_background_execution_feeds_queries() {
    let executions = Arc::new(AtomicUsize::new(0));
    let checker = HealthCheckerBuilder::new()
        .periodic_check(
            Duration::from_millis(10),
            None,
            Check::new("warehouse", counting_probe(&executions)),
        )
        .build()
        .unwrap();

    // Give the worker a few ticks.
    tokio::time::sleep(Duration::from_millis(60)).await;

    let before = executions.load(Ordering::SeqCst);
    assert!(before >= 1, "worker should have executed at least once");

    let result = checker.check().await;
    assert_eq!(result.status, Status::Up);

    // The query must not have run the periodic probe itself.
    checker.stop().await;
    let after = executions.load(Ordering::SeqCst);
    assert!(
        after <= before + 6,
        "query re-executed the periodic check: {} -> {}",
        before,
        after
    );
}

#[tokio::test]
async fn test_restart_after_stop() {
    let executions = Arc::new(AtomicUsize::new(0));
    let checker = HealthCheckerBuilder::new()
        .periodic_check(
            Duration::from_millis(10),
            None,
            Check::new("warehouse", counting_probe(&executions)),
        )
        .build()
        .unwrap();

    checker.stop().await;
    let stopped_at = executions.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(
        executions.load(Ordering::SeqCst),
        stopped_at,
        "stopped workers must not execute"
    );

    checker.start();
    tokio::time::sleep(Duration::from_millis(40)).await;
    checker.stop().await;
    assert!(
        executions.load(Ordering::SeqCst) > stopped_at,
        "restarted workers must execute again"
    );
}
