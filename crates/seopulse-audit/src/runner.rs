//! The audit orchestrator: owns one audit's walk through the state machine.
//!
//! `start_audit` is the public entry point: guard check, atomic claim,
//! then the processing task is spawned onto the runtime. `process_audit`
//! is equally valid to call inline (the scheduler and tests do); queueing
//! is a deployment choice, not a correctness requirement.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use seopulse_content::ContentClient;
use seopulse_core::AppConfig;
use seopulse_db::{AuditRow, DbError, NewIssue, NewResource, StoreRow};

use crate::cache::ContentCache;
use crate::checks::{self, CheckContext};
use crate::content::ContentFetcher;
use crate::error::AuditError;
use crate::events::{AuditEvent, EventBus};
use crate::guard::{self, AuditGate};
use crate::rate_limit::RateLimiter;
use crate::score::{health_score, IssueTally};
use crate::types::Issue;

/// Coarse progress milestones surfaced to polling UIs. Advisory only;
/// control flow never branches on them.
const PROGRESS_CLAIMED: i32 = 5;
const PROGRESS_CONTENT_FETCHED: i32 = 30;
const PROGRESS_CHECKS_DONE: i32 = 70;
const PROGRESS_RESULTS_SAVED: i32 = 95;

/// Engine tuning knobs, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cooldown: Duration,
    pub fetch_timeout: Duration,
    pub checks_timeout: Duration,
    pub page_size: u32,
    pub inter_request_delay_ms: u64,
    pub probe_limit: usize,
    pub probe_timeout: Duration,
}

impl EngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(config.audit_cooldown_secs),
            fetch_timeout: Duration::from_secs(config.audit_fetch_timeout_secs),
            checks_timeout: Duration::from_secs(config.audit_checks_timeout_secs),
            page_size: config.content_page_size,
            inter_request_delay_ms: config.content_inter_request_delay_ms,
            probe_limit: config.link_probe_limit,
            probe_timeout: Duration::from_secs(config.link_probe_timeout_secs),
        }
    }
}

/// What `start_audit` decided. A denial carries the gate verdict so callers
/// can surface the reason and retry time; it is not an error.
#[derive(Debug)]
pub enum StartOutcome {
    Started { audit_id: Uuid },
    Denied(AuditGate),
}

/// Drives audits end to end. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct AuditEngine {
    pool: PgPool,
    fetcher: Arc<ContentFetcher>,
    cache: Arc<ContentCache>,
    limiter: Arc<RateLimiter>,
    events: EventBus,
    check_ctx: CheckContext,
    config: EngineConfig,
}

impl AuditEngine {
    /// Wires the engine from its shared parts.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Http`] if the link-probe HTTP client cannot be
    /// constructed.
    pub fn new(
        pool: PgPool,
        client: Arc<ContentClient>,
        limiter: Arc<RateLimiter>,
        config: EngineConfig,
    ) -> Result<Self, AuditError> {
        let cache = Arc::new(ContentCache::new());
        let fetcher = Arc::new(ContentFetcher::new(
            Arc::clone(&client),
            Arc::clone(&cache),
            Arc::clone(&limiter),
            config.page_size,
            config.inter_request_delay_ms,
        ));
        let probe_http = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()?;

        Ok(Self {
            pool,
            fetcher,
            cache,
            limiter,
            events: EventBus::default(),
            check_ctx: CheckContext {
                http: probe_http,
                probe_limit: config.probe_limit,
                probe_timeout: config.probe_timeout,
            },
            config,
        })
    }

    /// The completion event bus, for collaborators that invalidate on audit
    /// completion.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The shared content cache.
    #[must_use]
    pub fn cache(&self) -> Arc<ContentCache> {
        Arc::clone(&self.cache)
    }

    /// The shared rate limiter (also backs the HTTP API's request gate).
    #[must_use]
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Requests a new audit for `store`.
    ///
    /// Runs the advisory gate, then claims the store atomically by creating
    /// the pending record; a lost race surfaces as a denial exactly like a
    /// gate denial. On success the processing task is spawned and the new
    /// audit's public id returned immediately.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Db`] if the gate lookups or the insert fail
    /// for reasons other than the single-flight claim.
    pub async fn start_audit(&self, store: &StoreRow) -> Result<StartOutcome, AuditError> {
        let gate = guard::can_run_audit(&self.pool, store.id, self.config.cooldown).await?;
        if !gate.allowed {
            return Ok(StartOutcome::Denied(gate));
        }

        let audit = match seopulse_db::create_audit(&self.pool, store.id).await {
            Ok(audit) => audit,
            Err(DbError::AuditAlreadyActive { .. }) => {
                // Another start won the claim between our gate read and the
                // insert; report it the same way the gate would have.
                return Ok(StartOutcome::Denied(AuditGate::denied(
                    "an audit is already pending or running for this store",
                    None,
                )));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            audit_id = %audit.public_id,
            store = %store.domain,
            "audit created; scheduling processing"
        );

        let engine = self.clone();
        let store = store.clone();
        let audit_row_id = audit.id;
        tokio::spawn(async move {
            if let Err(err) = engine.process_audit(audit_row_id, &store).await {
                tracing::error!(
                    audit_id = audit_row_id,
                    store = %store.domain,
                    error = %err,
                    "audit processing failed"
                );
            }
        });

        Ok(StartOutcome::Started {
            audit_id: audit.public_id,
        })
    }

    /// Processes one pending audit to a terminal state.
    ///
    /// Any pipeline error marks the audit failed (best effort) before being
    /// returned; partial accumulators recorded along the way are preserved.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error after the audit has been transitioned to
    /// `failed`.
    pub async fn process_audit(&self, audit_id: i64, store: &StoreRow) -> Result<(), AuditError> {
        match self.run_pipeline(audit_id, store).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail_best_effort(audit_id, &err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Reads the audit row for polling callers.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown id.
    pub async fn audit_status(&self, public_id: Uuid) -> Result<AuditRow, DbError> {
        seopulse_db::get_audit_by_public_id(&self.pool, public_id).await
    }

    async fn run_pipeline(&self, audit_id: i64, store: &StoreRow) -> Result<(), AuditError> {
        seopulse_db::start_audit(&self.pool, audit_id, PROGRESS_CLAIMED).await?;
        tracing::info!(audit_id, store = %store.domain, "audit running");

        let snapshot = tokio::time::timeout(
            self.config.fetch_timeout,
            self.fetcher.fetch_store_content(store),
        )
        .await
        .map_err(|_| AuditError::StageTimeout {
            stage: "content fetch",
            seconds: self.config.fetch_timeout.as_secs(),
        })??;

        let total = i32::try_from(snapshot.total_resources()).unwrap_or(i32::MAX);
        seopulse_db::set_audit_totals(&self.pool, audit_id, total).await?;

        // Refresh the durable resource index while the snapshot is at hand.
        let origin = ContentClient::store_origin(&store.domain);
        let catalog: Vec<NewResource> = snapshot
            .iter_all()
            .map(|resource| NewResource {
                url: resource.storefront_url(&origin),
                resource_kind: resource.kind,
                resource_id: resource.id,
                title: resource.title.clone(),
                handle: resource.handle.clone(),
            })
            .collect();
        seopulse_db::upsert_resources(&self.pool, store.id, &catalog).await?;

        seopulse_db::update_audit_progress(&self.pool, audit_id, PROGRESS_CONTENT_FETCHED).await?;
        tracing::info!(audit_id, total, "content fetched");

        let snapshot = Arc::new(snapshot);
        let outcomes = tokio::time::timeout(
            self.config.checks_timeout,
            checks::run_battery(Arc::clone(&snapshot), self.check_ctx.clone()),
        )
        .await
        .map_err(|_| AuditError::StageTimeout {
            stage: "check battery",
            seconds: self.config.checks_timeout.as_secs(),
        })?;

        seopulse_db::set_audit_processed(&self.pool, audit_id, total).await?;
        seopulse_db::update_audit_progress(&self.pool, audit_id, PROGRESS_CHECKS_DONE).await?;

        let tally = IssueTally::from_outcomes(&outcomes);
        let records: Vec<NewIssue> = outcomes
            .into_iter()
            .flat_map(|outcome| outcome.issues)
            .map(Issue::into_record)
            .collect();

        let persisted =
            seopulse_db::replace_store_issues(&self.pool, store.id, audit_id, &records).await?;
        seopulse_db::update_audit_progress(&self.pool, audit_id, PROGRESS_RESULTS_SAVED).await?;

        let score = health_score(&tally);
        seopulse_db::complete_audit(&self.pool, audit_id, tally.as_counts(), i32::from(score))
            .await?;

        self.events.publish(AuditEvent::Completed {
            store_id: store.id,
            store_domain: store.domain.clone(),
        });
        tracing::info!(
            audit_id,
            store = %store.domain,
            score,
            issues = persisted,
            "audit completed"
        );

        Ok(())
    }

    /// Marks the audit failed, logging rather than propagating a failure of
    /// the failure write itself, since the original error is what the caller
    /// needs to see.
    async fn fail_best_effort(&self, audit_id: i64, message: &str) {
        if let Err(err) = seopulse_db::fail_audit(&self.pool, audit_id, message).await {
            tracing::error!(audit_id, error = %err, "could not mark audit as failed");
        }
    }
}
