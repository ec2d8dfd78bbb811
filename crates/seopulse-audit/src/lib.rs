pub mod cache;
pub mod checks;
pub mod content;
pub mod error;
pub mod events;
pub mod guard;
pub mod rate_limit;
pub mod runner;
pub mod score;
pub mod types;

pub use cache::ContentCache;
pub use checks::CheckContext;
pub use content::ContentFetcher;
pub use error::AuditError;
pub use events::{AuditEvent, EventBus};
pub use guard::{can_run_audit, AuditGate};
pub use rate_limit::{rate_key, RateLimitConfig, RateLimitDecision, RateLimiter};
pub use runner::{AuditEngine, EngineConfig, StartOutcome};
pub use score::{health_score, IssueTally};
pub use types::{CheckOutcome, ContentSnapshot, Issue, Resource, ResourceImage};
