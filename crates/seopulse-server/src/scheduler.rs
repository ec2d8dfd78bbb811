//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring audit job.

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use seopulse_audit::{AuditEngine, StartOutcome};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    engine: AuditEngine,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_weekly_audit_job(&scheduler, pool, engine).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the weekly full-audit job.
///
/// Runs every Sunday at 03:00 UTC (`0 0 3 * * SUN`): every active store
/// gets an audit started, unless the guard denies it (a merchant-triggered
/// audit may have run recently, or one may still be in flight).
async fn register_weekly_audit_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    engine: AuditEngine,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 3 * * SUN", move |_uuid, _lock| {
        let pool = pool.clone();
        let engine = engine.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting weekly audit run");
            run_weekly_audits(&pool, &engine).await;
            tracing::info!("scheduler: weekly audit run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Start an audit for every active store, honoring guard denials.
async fn run_weekly_audits(pool: &PgPool, engine: &AuditEngine) {
    let stores = match seopulse_db::list_active_stores(pool).await {
        Ok(stores) => stores,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load active stores");
            return;
        }
    };

    if stores.is_empty() {
        tracing::info!("scheduler: no active stores; skipping");
        return;
    }

    tracing::info!(count = stores.len(), "scheduler: auditing active stores");

    for store in &stores {
        match engine.start_audit(store).await {
            Ok(StartOutcome::Started { audit_id }) => {
                tracing::info!(store = %store.domain, audit_id = %audit_id, "scheduler: audit started");
            }
            Ok(StartOutcome::Denied(gate)) => {
                tracing::info!(
                    store = %store.domain,
                    reason = gate.reason.as_deref().unwrap_or("not allowed"),
                    "scheduler: audit skipped"
                );
            }
            Err(e) => {
                tracing::error!(store = %store.domain, error = %e, "scheduler: audit start failed");
            }
        }
    }
}
