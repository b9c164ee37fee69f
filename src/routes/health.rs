//! Health check endpoints
//!
//! - `/health` - Full health check with dependency status
//! - `/health/ready` - Readiness probe
//! - `/health/live` - Liveness probe
//!
//! The document store is required; the cache is optional, so a cache
//! outage only degrades the service.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual dependency check result
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyCheck {
    fn from_result<E: std::fmt::Display>(start: Instant, result: Result<(), E>) -> Self {
        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => Self {
                status: HealthStatus::Healthy,
                latency_ms,
                error: None,
            },
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                latency_ms,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Dependency checks collection
#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub store: DependencyCheck,
    /// Absent when caching is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<DependencyCheck>,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub checks: DependencyChecks,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

async fn check_store(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    DependencyCheck::from_result(start, state.store.ping().await)
}

async fn check_cache(state: &AppState) -> Option<DependencyCheck> {
    let cache = state.read_guard.cache()?;
    let start = Instant::now();
    Some(DependencyCheck::from_result(start, cache.ping().await))
}

/// Combine dependency results into an overall status
pub fn overall_status(store: &HealthStatus, cache: Option<&HealthStatus>) -> HealthStatus {
    if *store == HealthStatus::Unhealthy {
        HealthStatus::Unhealthy
    } else if matches!(cache, Some(s) if *s != HealthStatus::Healthy) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Full health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let store_check = check_store(&state).await;
    let cache_check = check_cache(&state).await;

    let status = overall_status(
        &store_check.status,
        cache_check.as_ref().map(|c| &c.status),
    );

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks: DependencyChecks {
            store: store_check,
            cache: cache_check,
        },
    };

    (status_code, Json(response))
}

/// Readiness probe endpoint
///
/// Ready as long as the document store answers.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let store_check = check_store(&state).await;

    if store_check.status == HealthStatus::Unhealthy {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: HealthStatus::Unhealthy,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
