//! Severity aggregation and the overall health score.

use seopulse_core::Severity;
use seopulse_db::AuditCounts;

use crate::types::CheckOutcome;

/// Issue counts per severity across the whole battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueTally {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl IssueTally {
    /// Sums issue counts per severity across all check outcomes. Outcomes
    /// flagged with an error contribute whatever issues they managed to
    /// produce (usually none).
    #[must_use]
    pub fn from_outcomes(outcomes: &[CheckOutcome]) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            for issue in &outcome.issues {
                tally.add(issue.severity);
            }
        }
        tally
    }

    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    /// Persistence shape; counts saturate at `i32::MAX` rather than wrap.
    #[must_use]
    pub fn as_counts(&self) -> AuditCounts {
        AuditCounts {
            critical: i32::try_from(self.critical).unwrap_or(i32::MAX),
            high: i32::try_from(self.high).unwrap_or(i32::MAX),
            medium: i32::try_from(self.medium).unwrap_or(i32::MAX),
            low: i32::try_from(self.low).unwrap_or(i32::MAX),
        }
    }
}

/// The 0-100 health score:
///
/// ```text
/// score = clamp(100 - 10*critical - 5*high - 2*medium - 1*low, 0, 100)
/// ```
///
/// Deterministic and order-independent; dashboards and historical trend
/// rows depend on this exact weighting, so it must not drift.
#[must_use]
pub fn health_score(tally: &IssueTally) -> u8 {
    let penalty = 10 * i64::from(tally.critical)
        + 5 * i64::from(tally.high)
        + 2 * i64::from(tally.medium)
        + i64::from(tally.low);
    u8::try_from((100 - penalty).clamp(0, 100)).unwrap_or(0)
}
