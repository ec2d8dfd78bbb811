//! Database operations for the `stores` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: i64,
    pub public_id: Uuid,
    pub domain: String,
    pub name: String,
    pub plan: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const STORE_COLUMNS: &str = "id, public_id, domain, name, plan, is_active, created_at";

/// Creates a store. Used by onboarding glue and test seeding; the pipeline
/// itself only reads stores.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// domain).
pub async fn create_store(
    pool: &PgPool,
    domain: &str,
    name: &str,
    plan: &str,
) -> Result<StoreRow, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        "INSERT INTO stores (public_id, domain, name, plan) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {STORE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(domain)
    .bind(name)
    .bind(plan)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a store by its internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_store(pool: &PgPool, id: i64) -> Result<StoreRow, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Fetches a store by domain.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_store_by_domain(pool: &PgPool, domain: &str) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE domain = $1"
    ))
    .bind(domain)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all active stores, ordered by creation time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE is_active ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
