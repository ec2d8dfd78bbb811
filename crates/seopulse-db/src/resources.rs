//! Database operations for the `resources` table.

use chrono::{DateTime, Utc};
use seopulse_core::ResourceKind;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `resources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResourceRow {
    pub id: i64,
    pub store_id: i64,
    pub url: String,
    pub resource_kind: String,
    pub resource_id: i64,
    pub title: String,
    pub handle: String,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A resource observation about to be upserted.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub url: String,
    pub resource_kind: ResourceKind,
    pub resource_id: i64,
    pub title: String,
    pub handle: String,
}

/// Upserts the resources observed by one content fetch.
///
/// Conflicts on `(store_id, url)` refresh the descriptive fields and bump
/// `last_seen_at`; rows for resources the store has since deleted are left
/// in place (retention is an external concern).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails.
pub async fn upsert_resources(
    pool: &PgPool,
    store_id: i64,
    resources: &[NewResource],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    let mut written = 0u64;
    for resource in resources {
        sqlx::query(
            "INSERT INTO resources \
                 (store_id, url, resource_kind, resource_id, title, handle) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (store_id, url) DO UPDATE SET \
                 resource_kind = EXCLUDED.resource_kind, \
                 resource_id   = EXCLUDED.resource_id, \
                 title         = EXCLUDED.title, \
                 handle        = EXCLUDED.handle, \
                 last_seen_at  = NOW()",
        )
        .bind(store_id)
        .bind(&resource.url)
        .bind(resource.resource_kind.as_str())
        .bind(resource.resource_id)
        .bind(&resource.title)
        .bind(&resource.handle)
        .execute(&mut *tx)
        .await?;
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}

/// Returns a store's known resources, most recently seen first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_store_resources(
    pool: &PgPool,
    store_id: i64,
    limit: i64,
) -> Result<Vec<ResourceRow>, DbError> {
    let rows = sqlx::query_as::<_, ResourceRow>(
        "SELECT id, store_id, url, resource_kind, resource_id, title, handle, \
                last_seen_at, created_at \
         FROM resources \
         WHERE store_id = $1 \
         ORDER BY last_seen_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(store_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
