//! Advisory single-flight and cooldown gate for audit starts.
//!
//! This is a read-and-decide check with no side effects: it answers fast
//! for API callers, but the authoritative enforcement is the partial unique
//! index behind [`seopulse_db::create_audit`]: two racing starts that both
//! read "allowed" here still resolve to exactly one created audit.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use seopulse_db::DbError;

/// The gate's verdict. A denial is a normal result, never an error.
#[derive(Debug, Clone)]
pub struct AuditGate {
    pub allowed: bool,
    pub reason: Option<String>,
    pub next_allowed_at: Option<DateTime<Utc>>,
}

impl AuditGate {
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            next_allowed_at: None,
        }
    }

    #[must_use]
    pub fn denied(reason: impl Into<String>, next_allowed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            next_allowed_at,
        }
    }
}

/// Decides whether a new audit may start for `store_id`.
///
/// Denies while a pending/running audit exists, and within `cooldown` of
/// the most recent terminal audit's finish time (reporting when the next
/// start becomes possible).
///
/// # Errors
///
/// Returns [`DbError`] if either lookup fails; lookup failure is not a
/// denial.
pub async fn can_run_audit(
    pool: &PgPool,
    store_id: i64,
    cooldown: Duration,
) -> Result<AuditGate, DbError> {
    if seopulse_db::active_audit_exists(pool, store_id).await? {
        return Ok(AuditGate::denied(
            "an audit is already pending or running for this store",
            None,
        ));
    }

    if let Some(last) = seopulse_db::latest_terminal_audit(pool, store_id).await? {
        if let Some(finished_at) = last.completed_at {
            let next_allowed =
                finished_at + chrono::Duration::from_std(cooldown).unwrap_or_else(|_| chrono::Duration::zero());
            if Utc::now() < next_allowed {
                return Ok(AuditGate::denied(
                    format!(
                        "the previous audit finished at {finished_at}; audits are limited to one per cooldown window"
                    ),
                    Some(next_allowed),
                ));
            }
        }
    }

    Ok(AuditGate::allowed())
}
