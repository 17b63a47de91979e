//! Health check endpoint handlers.
//!
//! The cache is the only dependency probed. A failing cache backend marks the
//! service degraded, not unhealthy, since lookups fall through to the provider.

use std::collections::HashMap;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::Json};
use jiff::Timestamp;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{CacheStatus, ComponentHealth, HealthResponse, HealthStatus};
use crate::cache::CacheKey;
use crate::state::AppState;

/// Namespace of the key read by the cache probe. Never written.
const PROBE_NAMESPACE: &str = "health";

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Health summary with cache details
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Health summary including the active cache backend.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache_check = check_cache(&state).await;
    let status = cache_check.status;

    let mut checks = HashMap::new();
    checks.insert("cache".to_string(), cache_check);

    let response = HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: Timestamp::now().to_string(),
        cache: CacheStatus {
            backend: state.cache.backend_name().to_string(),
            ttl_seconds: state.cache.ttl().as_secs(),
            enabled: state.cache.is_enabled(),
        },
        checks,
    };

    let code = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(response))
}

/// Readiness probe endpoint.
///
/// Ready whenever lookups can be served, which a degraded cache allows.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match check_cache(&state).await.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Liveness probe endpoint.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Reads a probe key from the cache store.
async fn check_cache(state: &AppState) -> ComponentHealth {
    if !state.cache.is_enabled() {
        return ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some("caching disabled".to_string()),
            response_time_ms: None,
        };
    }

    let start = Instant::now();
    let backend = state.cache.backend_name();
    let probe = CacheKey::new(PROBE_NAMESPACE, "probe");

    match state.cache.store().get(&probe).await {
        Ok(_) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(format!("{} store reachable", backend)),
            response_time_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(backend, error = %e, error_kind = e.kind(), "Cache health probe failed");
            ComponentHealth {
                status: HealthStatus::Degraded,
                message: Some(format!("{} store unreachable: {}", backend, e.kind())),
                response_time_ms: Some(start.elapsed().as_millis() as u64),
            }
        }
    }
}
