//! Persisted issue listing for dashboard collaborators.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seopulse_core::{CheckKind, Severity};
use seopulse_db::IssueRow;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(crate) struct IssueData {
    pub check_kind: String,
    pub severity: String,
    pub resource_kind: String,
    pub resource_id: i64,
    pub resource_title: String,
    pub resource_handle: String,
    pub message: String,
    pub suggestion: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<IssueRow> for IssueData {
    fn from(row: IssueRow) -> Self {
        Self {
            check_kind: row.check_kind,
            severity: row.severity,
            resource_kind: row.resource_kind,
            resource_id: row.resource_id,
            resource_title: row.resource_title,
            resource_handle: row.resource_handle,
            message: row.message,
            suggestion: row.suggestion,
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuesQuery {
    check_kind: Option<String>,
    severity: Option<String>,
    limit: Option<i64>,
}

/// `GET /api/v1/stores/{domain}/issues`
pub(crate) async fn list_issues(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(domain): Path<String>,
    Query(query): Query<IssuesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let store = match seopulse_db::get_store_by_domain(&state.pool, &domain).await {
        Ok(Some(store)) => store,
        Ok(None) => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                format!("no store with domain \"{domain}\""),
            ))
        }
        Err(e) => return Err(map_db_error(req_id.0, &e)),
    };

    let check_kind = match query.check_kind.as_deref() {
        None => None,
        Some(raw) => match CheckKind::parse(raw) {
            Some(kind) => Some(kind),
            None => {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    format!("unknown check_kind \"{raw}\""),
                ))
            }
        },
    };

    let severity = match query.severity.as_deref() {
        None => None,
        Some(raw) => match Severity::parse(raw) {
            Some(severity) => Some(severity),
            None => {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    format!("unknown severity \"{raw}\""),
                ))
            }
        },
    };

    let limit = normalize_limit(query.limit);
    let rows = seopulse_db::list_store_issues(&state.pool, store.id, check_kind, severity, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data: Vec<IssueData> = rows.into_iter().map(IssueData::from).collect();
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
