//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (database)
//! GET  /media/...                           - Uploaded files
//!
//! # Users
//! POST /api/user/create                     - Register
//! POST /api/user/token                      - Obtain API token
//! GET|PUT|PATCH /api/user/me                - Current user
//!
//! # Tags and ingredients (token auth)
//! GET|POST /api/recipe/tags                 - List / create
//! GET|PUT|PATCH|DELETE /api/recipe/tags/{id}
//! GET|POST /api/recipe/ingredients          - List / create
//! GET|PUT|PATCH|DELETE /api/recipe/ingredients/{id}
//!
//! # Recipes (token auth)
//! GET|POST /api/recipe/recipes              - List (filterable) / create
//! GET|PUT|PATCH|DELETE /api/recipe/recipes/{id}
//! POST /api/recipe/recipes/{id}/upload-image
//! ```
//!
//! Trailing slashes are accepted on every route.

pub mod extract;
pub mod labels;
pub mod recipes;
pub mod user;

use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::from_fn,
    response::Response,
    routing::get,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::models::label::{IngredientKind, TagKind};
use crate::state::AppState;

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(user::routes())
        .merge(labels::routes::<TagKind>())
        .merge(labels::routes::<IngredientKind>())
        .merge(recipes::routes())
}

/// Build the complete application: routes, health checks, media files and
/// the middleware stack.
///
/// The router is wrapped in trailing-slash normalization, which has to run
/// before routing. Serve it with
/// `axum::ServiceExt::<Request>::into_make_service`.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let media = state.config().media.clone();

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service(&media.url, ServeDir::new(&media.root))
        .layer(DefaultBodyLimit::max(media.max_upload_bytes))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::body::{Body, to_bytes};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{ApiConfig, MediaConfig};

    /// State whose pool never connects; only usable for requests that are
    /// rejected before touching the database.
    fn offline_state() -> AppState {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost:1/unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            media: MediaConfig {
                root: PathBuf::from("media"),
                url: "/media".to_string(),
                max_upload_bytes: 1024 * 1024,
            },
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        AppState::new(config, pool)
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app(offline_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(offline_state())
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_auth() {
        for uri in [
            "/api/user/me",
            "/api/recipe/tags",
            "/api/recipe/ingredients",
            "/api/recipe/recipes",
            "/api/recipe/recipes/1",
        ] {
            let (status, body) = send(get_request(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(
                body["detail"], "Authentication credentials were not provided.",
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_trailing_slash_is_accepted() {
        let (status, _) = send(get_request("/api/recipe/tags/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_scheme_is_unauthorized() {
        let request = Request::builder()
            .uri("/api/recipe/recipes")
            .header("authorization", "Bearer abc")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/user/create")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_missing_email_names_field() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/user/create")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"password": "testpass"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["email"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_empty_email_is_rejected_before_the_database() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/user/create")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email": "", "password": "testpass", "name": "Test"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["email"].is_array());
    }

    #[tokio::test]
    async fn test_short_password_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/user/create")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email": "test@example.com", "password": "pw", "name": "Test"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["password"].is_array());
    }
}
