//! Audit start, polling, and history endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use seopulse_audit::StartOutcome;
use seopulse_db::{AuditRow, DbError, StoreRow};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// Wire shape of one audit for polling UIs.
#[derive(Debug, Serialize)]
pub(crate) struct AuditStatusData {
    pub audit_id: Uuid,
    pub status: String,
    pub progress: i32,
    pub total_urls: i32,
    pub completed: i32,
    pub critical_issues: i32,
    pub high_issues: i32,
    pub medium_issues: i32,
    pub low_issues: i32,
    pub overall_score: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<AuditRow> for AuditStatusData {
    fn from(row: AuditRow) -> Self {
        Self {
            audit_id: row.public_id,
            status: row.status,
            progress: row.progress,
            total_urls: row.total_urls,
            completed: row.completed,
            critical_issues: row.critical_issues,
            high_issues: row.high_issues,
            medium_issues: row.medium_issues,
            low_issues: row.low_issues,
            overall_score: row.overall_score,
            error_message: row.error_message,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

/// Wire shape of a start decision. A denial is a structured answer with a
/// reason and retry time, not an error payload.
#[derive(Debug, Serialize)]
pub(crate) struct AuditStartData {
    pub started: bool,
    pub audit_id: Option<Uuid>,
    pub reason: Option<String>,
    pub next_allowed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<i64>,
}

async fn load_store(
    state: &AppState,
    request_id: &str,
    domain: &str,
) -> Result<StoreRow, ApiError> {
    match seopulse_db::get_store_by_domain(&state.pool, domain).await {
        Ok(Some(store)) => Ok(store),
        Ok(None) => Err(ApiError::new(
            request_id.to_owned(),
            "not_found",
            format!("no store with domain \"{domain}\""),
        )),
        Err(e) => Err(map_db_error(request_id.to_owned(), &e)),
    }
}

/// `POST /api/v1/stores/{domain}/audits`
pub(crate) async fn start_audit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let store = load_store(&state, &req_id.0, &domain).await?;

    let outcome = state.engine.start_audit(&store).await.map_err(|e| {
        tracing::error!(store = %domain, error = %e, "audit start failed");
        ApiError::new(req_id.0.clone(), "internal_error", "audit start failed")
    })?;

    let meta = ResponseMeta::new(req_id.0);
    match outcome {
        StartOutcome::Started { audit_id } => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse {
                data: AuditStartData {
                    started: true,
                    audit_id: Some(audit_id),
                    reason: None,
                    next_allowed_at: None,
                },
                meta,
            }),
        )),
        StartOutcome::Denied(gate) => Ok((
            StatusCode::CONFLICT,
            Json(ApiResponse {
                data: AuditStartData {
                    started: false,
                    audit_id: None,
                    reason: gate.reason,
                    next_allowed_at: gate.next_allowed_at,
                },
                meta,
            }),
        )),
    }
}

/// `GET /api/v1/audits/{audit_id}`
pub(crate) async fn get_audit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(audit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    match state.engine.audit_status(audit_id).await {
        Ok(row) => Ok(Json(ApiResponse {
            data: AuditStatusData::from(row),
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(DbError::NotFound) => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no audit with id {audit_id}"),
        )),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

/// `GET /api/v1/stores/{domain}/audits`
pub(crate) async fn list_audits(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(domain): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let store = load_store(&state, &req_id.0, &domain).await?;
    let limit = normalize_limit(query.limit);

    let rows = seopulse_db::list_audits_for_store(&state.pool, store.id, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data: Vec<AuditStatusData> = rows.into_iter().map(AuditStatusData::from).collect();
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
