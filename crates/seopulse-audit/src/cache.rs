//! TTL cache for fetched store content, with single-flight population.
//!
//! Entries are keyed by `(store domain, resource kind)` so one store's
//! products, collections, and pages expire independently. Population is
//! serialized per key: concurrent fetches for the same key queue on a
//! per-key lock and the losers find the winner's entry on re-check, so the
//! upstream API sees one request instead of N.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use seopulse_core::ResourceKind;

use crate::types::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    domain: String,
    kind: ResourceKind,
}

#[derive(Debug)]
struct CacheEntry {
    resources: Vec<Resource>,
    stored: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored.elapsed() >= self.ttl
    }
}

/// Process-wide content cache. Injected where needed; constructed fresh per
/// process or per test.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    // Per-key population locks. Retained for the process lifetime; the key
    // space is bounded by stores x resource kinds.
    flights: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl ContentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unexpired entry for `(domain, kind)`, dropping it if the
    /// TTL has lapsed.
    pub async fn get(&self, domain: &str, kind: ResourceKind) -> Option<Vec<Resource>> {
        let key = CacheKey {
            domain: domain.to_owned(),
            kind,
        };
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(entry) if !entry.is_expired() => Some(entry.resources.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores `resources` for `(domain, kind)` with the given TTL.
    pub async fn put(
        &self,
        domain: &str,
        kind: ResourceKind,
        resources: Vec<Resource>,
        ttl: Duration,
    ) {
        let key = CacheKey {
            domain: domain.to_owned(),
            kind,
        };
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                resources,
                stored: Instant::now(),
                ttl,
            },
        );
    }

    /// Drops every entry belonging to `domain`, whatever the resource kind.
    /// Called when a data-changed signal for the store arrives.
    pub async fn invalidate_store(&self, domain: &str) {
        let mut entries = self.entries.lock().await;
        entries.retain(|key, _| key.domain != domain);
    }

    /// The population lock for `(domain, kind)`. Callers hold it across
    /// their re-check-then-fetch-then-put sequence.
    pub(crate) async fn flight(&self, domain: &str, kind: ResourceKind) -> Arc<Mutex<()>> {
        let key = CacheKey {
            domain: domain.to_owned(),
            kind,
        };
        let mut flights = self.flights.lock().await;
        Arc::clone(flights.entry(key).or_default())
    }
}
