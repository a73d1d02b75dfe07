//! HTTP endpoint collaborator over a real socket.

use std::time::Duration;

use reqwest::StatusCode;
use tokio_health::{Check, HealthCheckerBuilder};

use crate::helpers::TestEndpoint;

#[tokio::test]
async fn test_healthy_service_returns_200() {
    let checker = HealthCheckerBuilder::new()
        .check(Check::new("database", || async { Ok(()) }))
        .build()
        .unwrap();
    let server = TestEndpoint::spawn(checker).await;

    let response = server.get_health().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["Content-Type"].to_str().unwrap(),
        "application/json"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "up");
    assert_eq!(body["details"]["database"]["status"], "up");
    assert!(body["details"]["database"]["timestamp"].is_string());
    assert!(body["details"]["database"].get("error").is_none());
}

#[tokio::test]
async fn test_failing_service_returns_503() {
    let checker = HealthCheckerBuilder::new()
        .check(Check::new("database", || async { Ok(()) }))
        .check(Check::new("broker", || async { Err(anyhow::anyhow!("boom")) }))
        .build()
        .unwrap();
    let server = TestEndpoint::spawn(checker).await;

    let response = server.get_health().await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "down");
    assert_eq!(body["details"]["broker"]["status"], "down");
    assert_eq!(body["details"]["broker"]["error"], "boom");
    assert_eq!(body["details"]["database"]["status"], "up");
}

#[tokio::test]
async fn test_unknown_service_returns_503() {
    let checker = HealthCheckerBuilder::new()
        .manual_periodic_check_start()
        .periodic_check(
            Duration::from_secs(3600),
            None,
            Check::new("warehouse", || async { Ok(()) }),
        )
        .build()
        .unwrap();
    let server = TestEndpoint::spawn(checker).await;

    let response = server.get_health().await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unknown");
    assert!(body["details"]["warehouse"].get("timestamp").is_none());
}

#[tokio::test]
async fn test_suppressed_details_are_omitted() {
    let checker = HealthCheckerBuilder::new()
        .disabled_details()
        .check(Check::new("database", || async { Ok(()) }))
        .build()
        .unwrap();
    let server = TestEndpoint::spawn(checker).await;

    let body: serde_json::Value = server.get_health().await.json().await.unwrap();
    assert_eq!(body["status"], "up");
    assert!(body.get("details").is_none());
}
