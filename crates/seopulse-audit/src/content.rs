//! Store content retrieval: cache, daily budget, pagination, degradation.
//!
//! Per resource type the fetcher consults the TTL cache first (population
//! is single-flight per key), charges the store's daily content-API budget,
//! then drains the type's pages. A type that fails mid-drain contributes
//! whatever it accumulated and is marked incomplete; the fetch as a whole
//! errors only when every type failed and nothing at all was gathered.

use std::sync::Arc;
use std::time::Duration;

use seopulse_content::ContentClient;
use seopulse_core::{PlanLimits, ResourceKind};
use seopulse_db::StoreRow;

use crate::cache::ContentCache;
use crate::error::AuditError;
use crate::rate_limit::{rate_key, RateLimitConfig, RateLimiter};
use crate::types::{ContentSnapshot, Resource};

/// Products and collections change often enough that a quarter hour is the
/// longest staleness the dashboard tolerates; pages are slower-moving.
const PRODUCTS_TTL: Duration = Duration::from_secs(15 * 60);
const COLLECTIONS_TTL: Duration = Duration::from_secs(15 * 60);
const PAGES_TTL: Duration = Duration::from_secs(30 * 60);

const BUDGET_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of fetching one resource kind: what was gathered, and the error
/// text when the drain stopped early.
struct KindFetch {
    resources: Vec<Resource>,
    error: Option<String>,
}

pub struct ContentFetcher {
    client: Arc<ContentClient>,
    cache: Arc<ContentCache>,
    limiter: Arc<RateLimiter>,
    page_size: u32,
    inter_request_delay_ms: u64,
}

impl ContentFetcher {
    #[must_use]
    pub fn new(
        client: Arc<ContentClient>,
        cache: Arc<ContentCache>,
        limiter: Arc<RateLimiter>,
        page_size: u32,
        inter_request_delay_ms: u64,
    ) -> Self {
        Self {
            client,
            cache,
            limiter,
            page_size,
            inter_request_delay_ms,
        }
    }

    /// Retrieves the full auditable content set for a store.
    ///
    /// # Errors
    ///
    /// - [`AuditError::MissingContentOrigin`] — the store has no content
    ///   origin configured. A misconfigured store is an error, never a
    ///   silent empty result.
    /// - [`AuditError::NoContent`] — all three resource types failed and
    ///   nothing was gathered.
    pub async fn fetch_store_content(
        &self,
        store: &StoreRow,
    ) -> Result<ContentSnapshot, AuditError> {
        let domain = store.domain.trim();
        if domain.is_empty() {
            return Err(AuditError::MissingContentOrigin {
                domain: store.domain.clone(),
            });
        }

        let limits = PlanLimits::for_plan(&store.plan);

        let products = self.fetch_kind(domain, ResourceKind::Product, &limits).await;
        let collections = self
            .fetch_kind(domain, ResourceKind::Collection, &limits)
            .await;
        let pages = self.fetch_kind(domain, ResourceKind::Page, &limits).await;

        let all_failed =
            products.error.is_some() && collections.error.is_some() && pages.error.is_some();
        let total =
            products.resources.len() + collections.resources.len() + pages.resources.len();
        if all_failed && total == 0 {
            return Err(AuditError::NoContent {
                domain: domain.to_owned(),
            });
        }

        let mut incomplete = Vec::new();
        for (kind, fetch) in [
            (ResourceKind::Product, &products),
            (ResourceKind::Collection, &collections),
            (ResourceKind::Page, &pages),
        ] {
            if let Some(error) = &fetch.error {
                tracing::warn!(
                    store = domain,
                    kind = %kind,
                    gathered = fetch.resources.len(),
                    error,
                    "resource type fetched partially; audit continues on what was gathered"
                );
                incomplete.push(kind);
            }
        }

        Ok(ContentSnapshot {
            products: products.resources,
            collections: collections.resources,
            pages: pages.resources,
            incomplete,
        })
    }

    async fn fetch_kind(&self, domain: &str, kind: ResourceKind, limits: &PlanLimits) -> KindFetch {
        if let Some(hit) = self.cache.get(domain, kind).await {
            tracing::debug!(store = domain, kind = %kind, count = hit.len(), "content cache hit");
            return KindFetch {
                resources: hit,
                error: None,
            };
        }

        // Serialize population per (store, kind); whoever loses the race
        // finds the winner's entry on re-check.
        let flight = self.cache.flight(domain, kind).await;
        let _population_guard = flight.lock().await;
        if let Some(hit) = self.cache.get(domain, kind).await {
            return KindFetch {
                resources: hit,
                error: None,
            };
        }

        let budget = self
            .limiter
            .check(
                &rate_key(domain, "content_api"),
                RateLimitConfig::new(limits.content_calls_per_day, BUDGET_WINDOW),
            )
            .await;
        if !budget.allowed {
            return KindFetch {
                resources: Vec::new(),
                error: Some(format!(
                    "daily content-API budget exhausted (limit {}, resets at {})",
                    budget.limit, budget.reset_at
                )),
            };
        }

        let cap = limits.cap_for(kind) as usize;
        let (resources, error) = match kind {
            ResourceKind::Product => {
                let drained = self
                    .client
                    .drain_products(domain, self.page_size, cap, self.inter_request_delay_ms)
                    .await;
                let resources: Vec<Resource> = drained
                    .items
                    .into_iter()
                    .filter(|product| {
                        product
                            .status
                            .as_deref()
                            .is_none_or(|status| status.eq_ignore_ascii_case("active"))
                    })
                    .map(Resource::from_product)
                    .collect();
                (resources, drained.error)
            }
            ResourceKind::Collection => {
                let drained = self
                    .client
                    .drain_collections(domain, self.page_size, cap, self.inter_request_delay_ms)
                    .await;
                let resources = drained
                    .items
                    .into_iter()
                    .map(Resource::from_collection)
                    .collect();
                (resources, drained.error)
            }
            ResourceKind::Page => {
                let drained = self
                    .client
                    .drain_pages(domain, self.page_size, cap, self.inter_request_delay_ms)
                    .await;
                let resources = drained.items.into_iter().map(Resource::from_page).collect();
                (resources, drained.error)
            }
        };

        // Only complete drains are cached: a partial catalog cached for the
        // full TTL would hide resources from every audit in the window.
        if error.is_none() {
            self.cache
                .put(domain, kind, resources.clone(), ttl_for(kind))
                .await;
        }

        KindFetch {
            resources,
            error: error.map(|e| e.to_string()),
        }
    }
}

fn ttl_for(kind: ResourceKind) -> Duration {
    match kind {
        ResourceKind::Product => PRODUCTS_TTL,
        ResourceKind::Collection => COLLECTIONS_TTL,
        ResourceKind::Page => PAGES_TTL,
    }
}
