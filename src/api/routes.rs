//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use std::time::Duration;

use axum::{
    Router,
    http::{StatusCode, Uri},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::error::AppError;
use crate::state::AppState;

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. CORS (any origin, method and header)
/// 2. Compression
/// 3. Request ID - generates/propagates request IDs
/// 4. Logging - logs requests with request IDs
/// 5. Error handler - renders errors as JSON with the request ID
/// 6. Timeout, answering 408 after `request_timeout`
///
/// # Routes
/// - `/health`, `/health/live`, `/health/ready`
/// - `/{ticker}`, `/{ticker}/history`
/// - `/swagger-ui` and `/api-docs/openapi.json`
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::health::health_routes())
        .merge(handlers::ticker::ticker_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, api))
        .fallback(|uri: Uri| async move { AppError::not_found("route", "path", uri.path()) })
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::header;
    use axum::response::Response;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::{CacheManager, LocalStore};
    use crate::services::test_support::FakeProvider;

    struct Harness {
        router: Router,
        provider: Arc<FakeProvider>,
        _dir: TempDir,
    }

    async fn harness(ttl: Duration) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let provider = Arc::new(FakeProvider::default());
        let cache = CacheManager::with_store(Arc::new(store), ttl);
        let state = AppState::new(provider.clone(), cache);
        Harness {
            router: create_router(state, Duration::from_secs(5)),
            provider,
            _dir: dir,
        }
    }

    async fn get(router: &Router, uri: &str) -> Response {
        router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ticker_info_ok() {
        let h = harness(Duration::from_secs(3_600)).await;

        let response = get(&h.router, "/aapl").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = json(response).await;
        assert_eq!(body["ticker"], "AAPL");
        assert_eq!(body["name"], "Apple Inc.");
        assert_eq!(body["ex_dividend_date"], "2024-05-10");
        assert_eq!(body["yearly_price_range"]["high"], 199.6);
    }

    #[tokio::test]
    async fn test_second_request_hits_cache() {
        let h = harness(Duration::from_secs(3_600)).await;

        assert_eq!(get(&h.router, "/AAPL").await.status(), StatusCode::OK);
        assert_eq!(get(&h.router, "/aapl").await.status(), StatusCode::OK);

        assert_eq!(h.provider.info_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_fetches() {
        let h = harness(Duration::ZERO).await;

        get(&h.router, "/AAPL").await;
        get(&h.router, "/AAPL").await;

        assert_eq!(h.provider.info_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_404() {
        let h = harness(Duration::from_secs(3_600)).await;

        let response = get(&h.router, "/does-not-exist").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
        let body = json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["request_id"], request_id);
    }

    #[tokio::test]
    async fn test_batch_symbols_are_rejected() {
        let h = harness(Duration::from_secs(3_600)).await;

        let response = get(&h.router, "/AAPL,MSFT").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "VALIDATION_ERROR");
        assert_eq!(h.provider.info_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_502() {
        let h = harness(Duration::from_secs(3_600)).await;
        h.provider.set_failing(true);

        let response = get(&h.router, "/AAPL").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json(response).await["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_history_ok() {
        let h = harness(Duration::from_secs(3_600)).await;

        let response = get(&h.router, "/AAPL/history?start=2024-01-01&end=2024-01-03").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!([180.0, 181.0]));
    }

    #[tokio::test]
    async fn test_history_inverted_range_is_400() {
        let h = harness(Duration::from_secs(3_600)).await;

        let response = get(&h.router, "/AAPL/history?start=2024-02-01&end=2024-01-01").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["field"], "start");
    }

    #[tokio::test]
    async fn test_history_bad_date_is_400() {
        let h = harness(Duration::from_secs(3_600)).await;

        let response = get(&h.router, "/AAPL/history?start=yesterday&end=2024-01-01").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_health_reports_cache() {
        let h = harness(Duration::from_secs(60)).await;

        let response = get(&h.router, "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["cache"]["backend"], "local");
        assert_eq!(body["cache"]["ttl_seconds"], 60);
        assert_eq!(body["checks"]["cache"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_probes() {
        let h = harness(Duration::from_secs(60)).await;

        assert_eq!(get(&h.router, "/health/live").await.status(), StatusCode::OK);
        assert_eq!(get(&h.router, "/health/ready").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let h = harness(Duration::from_secs(60)).await;

        let response = get(&h.router, "/a/b/c").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["details"]["value"], "/a/b/c");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let h = harness(Duration::from_secs(60)).await;

        let response = get(&h.router, OPENAPI_PATH).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert!(body["paths"]["/{ticker}"].is_object());
        assert!(body["paths"]["/{ticker}/history"].is_object());
        assert!(body["paths"]["/health"].is_object());
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let h = harness(Duration::from_secs(60)).await;

        let response = h
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
