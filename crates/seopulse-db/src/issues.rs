//! Database operations for the `issues` table.

use chrono::{DateTime, Utc};
use seopulse_core::{CheckKind, ResourceKind, Severity};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `issues` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssueRow {
    pub id: i64,
    pub store_id: i64,
    pub audit_id: i64,
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

/// An issue about to be persisted.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub check_kind: CheckKind,
    pub severity: Severity,
    pub resource_kind: ResourceKind,
    pub resource_id: i64,
    pub resource_title: String,
    pub resource_handle: String,
    pub message: String,
    pub suggestion: String,
    pub detail: Option<serde_json::Value>,
}

const ISSUE_COLUMNS: &str = "id, store_id, audit_id, check_kind, severity, resource_kind, \
     resource_id, resource_title, resource_handle, message, suggestion, detail, created_at";

/// Replaces a store's persisted issues with the given audit's findings.
///
/// Runs as one transaction: dashboard readers never observe a half-written
/// issue list. Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete, any insert, or the commit fails.
pub async fn replace_store_issues(
    pool: &PgPool,
    store_id: i64,
    audit_id: i64,
    issues: &[NewIssue],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM issues WHERE store_id = $1")
        .bind(store_id)
        .execute(&mut *tx)
        .await?;

    let mut inserted = 0u64;
    for issue in issues {
        sqlx::query(
            "INSERT INTO issues \
                 (store_id, audit_id, check_kind, severity, resource_kind, resource_id, \
                  resource_title, resource_handle, message, suggestion, detail) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(store_id)
        .bind(audit_id)
        .bind(issue.check_kind.as_str())
        .bind(issue.severity.as_str())
        .bind(issue.resource_kind.as_str())
        .bind(issue.resource_id)
        .bind(&issue.resource_title)
        .bind(&issue.resource_handle)
        .bind(&issue.message)
        .bind(&issue.suggestion)
        .bind(&issue.detail)
        .execute(&mut *tx)
        .await?;
        inserted += 1;
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Returns a store's persisted issues, optionally filtered by check kind
/// and/or severity, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_store_issues(
    pool: &PgPool,
    store_id: i64,
    check_kind: Option<CheckKind>,
    severity: Option<Severity>,
    limit: i64,
) -> Result<Vec<IssueRow>, DbError> {
    let rows = sqlx::query_as::<_, IssueRow>(&format!(
        "SELECT {ISSUE_COLUMNS} FROM issues \
         WHERE store_id = $1 \
           AND ($2::text IS NULL OR check_kind = $2) \
           AND ($3::text IS NULL OR severity = $3) \
         ORDER BY id \
         LIMIT $4"
    ))
    .bind(store_id)
    .bind(check_kind.map(CheckKind::as_str))
    .bind(severity.map(Severity::as_str))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
