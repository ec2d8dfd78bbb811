mod audits;
mod issues;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use seopulse_audit::AuditEngine;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, ApiRateLimit, AuthState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: AuditEngine,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &seopulse_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: ApiRateLimit) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/stores/{domain}/audits",
            get(audits::list_audits).post(audits::start_audit),
        )
        .route("/api/v1/audits/{audit_id}", get(audits::get_audit))
        .route("/api/v1/stores/{domain}/issues", get(issues::list_issues))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: ApiRateLimit) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match seopulse_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::audits::AuditStatusData;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    use seopulse_audit::{EngineConfig, RateLimiter};
    use seopulse_content::ContentClient;

    fn test_engine(pool: sqlx::PgPool) -> AuditEngine {
        let client =
            Arc::new(ContentClient::new(5, "seopulse-test/0.1", 0, 0).expect("content client"));
        let limiter = Arc::new(RateLimiter::new());
        let config = EngineConfig {
            cooldown: Duration::ZERO,
            fetch_timeout: Duration::from_secs(30),
            checks_timeout: Duration::from_secs(30),
            page_size: 50,
            inter_request_delay_ms: 0,
            probe_limit: 10,
            probe_timeout: Duration::from_secs(2),
        };
        AuditEngine::new(pool, client, limiter, config).expect("engine")
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let engine = test_engine(pool.clone());
        let rate_limit = ApiRateLimit::new(engine.limiter(), 1_000);
        let auth = AuthState::from_env(true).expect("auth");
        build_app(AppState { pool, engine }, auth, rate_limit)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_codes_map_to_http_statuses() {
        let conflict = ApiError::new("req-1", "conflict", "busy").into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        let invalid = ApiError::new("req-2", "validation_error", "bad").into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        let missing = ApiError::new("req-3", "not_found", "gone").into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn audit_status_data_is_serializable() {
        let data = AuditStatusData {
            audit_id: Uuid::new_v4(),
            status: "completed".to_owned(),
            progress: 100,
            total_urls: 3,
            completed: 3,
            critical_issues: 1,
            high_issues: 2,
            medium_issues: 0,
            low_issues: 0,
            overall_score: Some(80),
            error_message: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
        };
        let json = serde_json::to_value(&data).expect("serialize");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["overall_score"], 80);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_returns_ok_with_live_database(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_audit_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/audits/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn start_audit_returns_404_for_unknown_store(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/stores/nope.example.com/audits")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn start_audit_conflicts_while_one_is_in_flight(pool: sqlx::PgPool) {
        let store = seopulse_db::create_store(&pool, "busy.example.com", "Busy", "free")
            .await
            .expect("store");
        seopulse_db::create_audit(&pool, store.id).await.expect("pending audit");

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/stores/busy.example.com/audits")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["data"]["started"], false);
        assert!(json["data"]["reason"].as_str().expect("reason").contains("already"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_audits_returns_store_history(pool: sqlx::PgPool) {
        let store = seopulse_db::create_store(&pool, "history.example.com", "H", "free")
            .await
            .expect("store");
        let audit = seopulse_db::create_audit(&pool, store.id).await.expect("audit");
        seopulse_db::start_audit(&pool, audit.id, 5).await.expect("start");
        seopulse_db::fail_audit(&pool, audit.id, "boom").await.expect("fail");

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stores/history.example.com/audits?limit=10")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["status"], "failed");
        assert_eq!(data[0]["error_message"], "boom");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_issues_rejects_unknown_filter_values(pool: sqlx::PgPool) {
        seopulse_db::create_store(&pool, "filters.example.com", "F", "free")
            .await
            .expect("store");

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stores/filters.example.com/issues?severity=apocalyptic")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
