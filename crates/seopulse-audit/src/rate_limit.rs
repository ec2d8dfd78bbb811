//! Fixed-window rate limiting keyed by `(subject, operation)`.
//!
//! Counters are process-local and lost on restart; the limiter only
//! throttles, it does not carry correctness. In a multi-process deployment
//! each process enforces its own fraction of the limit unless backed by a
//! shared store; that is an accepted property, not a bug to paper over.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Per-call limit configuration: `limit` operations per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    #[must_use]
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// The answer for one call: whether it may proceed, and the window
/// bookkeeping callers surface to API clients.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// When the current window rolls over. Stable across calls within the
    /// same window.
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct CounterWindow {
    /// Monotonic clock drives rollover decisions.
    started: Instant,
    /// Wall clock only reports `reset_at` to callers.
    started_wall: DateTime<Utc>,
    count: u32,
}

/// Keyed fixed-window counters behind one async mutex, so the
/// increment-and-check is atomic per call. Constructed per process (or per
/// test) and injected; never a module-level global.
#[derive(Debug, Default)]
pub struct RateLimiter {
    counters: Mutex<HashMap<String, CounterWindow>>,
}

/// Canonical `(subject, operation)` key form.
#[must_use]
pub fn rate_key(subject: &str, operation: &str) -> String {
    format!("{subject}:{operation}")
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts this call against `key`'s current window and decides whether
    /// it is allowed.
    ///
    /// The counter increments on every call, allowed or not; `allowed` is
    /// whether the count before this call was still under the limit, so
    /// `limit == 0` denies from the first call. When the window has elapsed
    /// the counter resets before evaluating.
    pub async fn check(&self, key: &str, config: RateLimitConfig) -> RateLimitDecision {
        let mut counters = self.counters.lock().await;
        let now = Instant::now();

        let window = counters.entry(key.to_owned()).or_insert_with(|| CounterWindow {
            started: now,
            started_wall: Utc::now(),
            count: 0,
        });

        if now.duration_since(window.started) >= config.window {
            window.started = now;
            window.started_wall = Utc::now();
            window.count = 0;
        }

        window.count = window.count.saturating_add(1);
        let allowed = window.count <= config.limit;
        let remaining = config.limit.saturating_sub(window.count);
        let reset_at = window.started_wall
            + chrono::Duration::from_std(config.window).unwrap_or_else(|_| chrono::Duration::zero());

        RateLimitDecision {
            allowed,
            limit: config.limit,
            remaining,
            reset_at,
        }
    }
}
