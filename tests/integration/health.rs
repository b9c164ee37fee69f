//! Health endpoint integration tests
//!
//! Tests for the health check endpoints:
//! - GET /health - Full health check with dependency status
//! - GET /health/ready - Readiness probe
//! - GET /health/live - Liveness probe

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_endpoint_returns_proper_structure() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
    assert!(body["timestamp"].is_string());
    assert_eq!(body["checks"]["store"]["status"], "healthy");
    assert_eq!(body["checks"]["cache"]["status"], "healthy");
}

#[tokio::test]
async fn test_cache_outage_degrades_health() {
    let app = TestApp::new();
    app.cache.set_offline(true);

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["cache"]["status"], "unhealthy");
    assert!(body["checks"]["cache"]["error"].is_string());

    app.server.get("/health/ready").await.assert_status_ok();
}

#[tokio::test]
async fn test_store_outage_is_unhealthy() {
    let app = TestApp::new();
    app.store.set_offline(true);

    let response = app.server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["status"], "unhealthy");

    let ready = app.server.get("/health/ready").await;
    ready.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready.json::<Value>()["status"], "unhealthy");
}

#[tokio::test]
async fn test_disabled_cache_is_omitted() {
    let app = TestApp::without_cache();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert!(body["checks"].get("cache").is_none());
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let app = TestApp::new();
    app.store.set_offline(true);

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_root_endpoints() {
    let app = TestApp::new();

    let root = app.server.get("/").await;
    root.assert_status_ok();
    assert_eq!(root.json::<Value>()["message"], "Hello world");

    let api = app.server.get("/api/v1").await;
    api.assert_status_ok();
    assert!(api.json::<Value>()["message"].is_string());
}
