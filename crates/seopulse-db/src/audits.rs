//! Database operations for the `audits` table.
//!
//! Every lifecycle transition is a status-guarded UPDATE: the query names
//! the state it expects (`WHERE status = ...`) and zero affected rows maps
//! to [`DbError::InvalidAuditTransition`]. Terminal rows therefore cannot be
//! overwritten by a late or repeated completion/failure call, and the
//! partial unique index `audits_one_active_per_store` makes the insert the
//! atomic single-flight claim for a store.

use chrono::{DateTime, Utc};
use seopulse_core::AuditStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `audits` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub id: i64,
    pub public_id: Uuid,
    pub store_id: i64,
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

impl AuditRow {
    /// Typed view of the status column. `None` would mean a value outside
    /// the schema's CHECK constraint, which no code path writes.
    #[must_use]
    pub fn status(&self) -> Option<AuditStatus> {
        AuditStatus::parse(&self.status)
    }
}

/// Per-severity issue totals recorded on completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditCounts {
    pub critical: i32,
    pub high: i32,
    pub medium: i32,
    pub low: i32,
}

const AUDIT_COLUMNS: &str = "id, public_id, store_id, status, progress, total_urls, completed, \
     critical_issues, high_issues, medium_issues, low_issues, overall_score, \
     error_message, created_at, started_at, completed_at";

/// Creates a new audit in `pending` status with zeroed accumulators.
///
/// This insert is the atomic claim on the store: the partial unique index
/// on non-terminal audits rejects a second concurrent claim.
///
/// # Errors
///
/// Returns [`DbError::AuditAlreadyActive`] when a pending/running audit
/// already exists for the store, or [`DbError::Sqlx`] for other failures.
pub async fn create_audit(pool: &PgPool, store_id: i64) -> Result<AuditRow, DbError> {
    let result = sqlx::query_as::<_, AuditRow>(&format!(
        "INSERT INTO audits (public_id, store_id, status) \
         VALUES ($1, $2, 'pending') \
         RETURNING {AUDIT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(store_id)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(row),
        Err(sqlx::Error::Database(db_err))
            if db_err.constraint() == Some("audits_one_active_per_store") =>
        {
            Err(DbError::AuditAlreadyActive { store_id })
        }
        Err(e) => Err(e.into()),
    }
}

/// Claims a pending audit: marks it `running`, records `started_at`, and
/// sets the initial progress signal.
///
/// # Errors
///
/// Returns [`DbError::InvalidAuditTransition`] if the audit is not pending,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_audit(pool: &PgPool, id: i64, initial_progress: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE audits \
         SET status = 'running', started_at = NOW(), progress = $1 \
         WHERE id = $2 AND status = 'pending'",
    )
    .bind(initial_progress)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAuditTransition {
            id,
            expected: "pending",
        });
    }

    Ok(())
}

/// Advances the progress signal of a running audit.
///
/// `GREATEST` keeps progress monotonically non-decreasing even if milestone
/// writes land out of order.
///
/// # Errors
///
/// Returns [`DbError::InvalidAuditTransition`] if the audit is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn update_audit_progress(pool: &PgPool, id: i64, progress: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE audits \
         SET progress = GREATEST(progress, $1) \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(progress)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAuditTransition {
            id,
            expected: "running",
        });
    }

    Ok(())
}

/// Records the number of resources discovered by the content fetch.
///
/// # Errors
///
/// Returns [`DbError::InvalidAuditTransition`] if the audit is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn set_audit_totals(pool: &PgPool, id: i64, total_urls: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE audits \
         SET total_urls = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(total_urls)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAuditTransition {
            id,
            expected: "running",
        });
    }

    Ok(())
}

/// Records how many discovered resources have been processed by the battery.
///
/// `LEAST` keeps the `completed <= total_urls` invariant even if a caller
/// passes a stale count.
///
/// # Errors
///
/// Returns [`DbError::InvalidAuditTransition`] if the audit is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn set_audit_processed(pool: &PgPool, id: i64, completed: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE audits \
         SET completed = LEAST($1, total_urls) \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAuditTransition {
            id,
            expected: "running",
        });
    }

    Ok(())
}

/// Marks a running audit `completed`: records the per-severity counts, the
/// overall score, `completed_at`, and forces progress to 100.
///
/// # Errors
///
/// Returns [`DbError::InvalidAuditTransition`] if the audit is not running
/// (including when it already reached a terminal state), or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_audit(
    pool: &PgPool,
    id: i64,
    counts: AuditCounts,
    overall_score: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE audits \
         SET status = 'completed', completed_at = NOW(), progress = 100, \
             critical_issues = $1, high_issues = $2, medium_issues = $3, low_issues = $4, \
             overall_score = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(counts.critical)
    .bind(counts.high)
    .bind(counts.medium)
    .bind(counts.low)
    .bind(overall_score)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAuditTransition {
            id,
            expected: "running",
        });
    }

    Ok(())
}

/// Marks a non-terminal audit `failed` with the error message.
///
/// Accumulators already recorded (totals, processed count) are preserved so
/// partial results stay visible; progress is left where it was and
/// `overall_score` stays NULL.
///
/// # Errors
///
/// Returns [`DbError::InvalidAuditTransition`] if the audit already reached
/// a terminal state, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_audit(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE audits \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status IN ('pending', 'running')",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAuditTransition {
            id,
            expected: "pending or running",
        });
    }

    Ok(())
}

/// Fetches a single audit by its internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_audit(pool: &PgPool, id: i64) -> Result<AuditRow, DbError> {
    let row = sqlx::query_as::<_, AuditRow>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Fetches a single audit by its public id (the form handed to API callers).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_audit_by_public_id(pool: &PgPool, public_id: Uuid) -> Result<AuditRow, DbError> {
    let row = sqlx::query_as::<_, AuditRow>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// `true` when the store has an audit in `pending` or `running`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn active_audit_exists(pool: &PgPool, store_id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (\
             SELECT 1 FROM audits \
             WHERE store_id = $1 AND status IN ('pending', 'running')\
         )",
    )
    .bind(store_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// The most recently finished audit (completed or failed) for a store, used
/// by the cooldown gate.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_terminal_audit(
    pool: &PgPool,
    store_id: i64,
) -> Result<Option<AuditRow>, DbError> {
    let row = sqlx::query_as::<_, AuditRow>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits \
         WHERE store_id = $1 AND status IN ('completed', 'failed') \
         ORDER BY completed_at DESC NULLS LAST, id DESC \
         LIMIT 1"
    ))
    .bind(store_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the most recent `limit` audits for a store.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_audits_for_store(
    pool: &PgPool,
    store_id: i64,
    limit: i64,
) -> Result<Vec<AuditRow>, DbError> {
    let rows = sqlx::query_as::<_, AuditRow>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits \
         WHERE store_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(store_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
