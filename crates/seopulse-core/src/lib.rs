use serde::{Deserialize, Serialize};
use thiserror::Error;

mod app_config;
mod config;
mod limits;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use limits::PlanLimits;

/// Priority tier of an SEO finding. Fixed per check kind, never per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Parses the lowercase wire/database form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven analysis rules the audit battery runs.
///
/// Each kind carries a fixed severity (see [`CheckKind::severity`]) so that
/// aggregation never has to inspect individual issues to classify them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    MissingMetaTitle,
    DuplicateMetaTitles,
    MissingMetaDescription,
    MissingAltText,
    BrokenLinks,
    MixedContent,
    UnindexableContent,
}

impl CheckKind {
    /// All checks, in the order the battery reports them.
    pub const ALL: [CheckKind; 7] = [
        CheckKind::MissingMetaTitle,
        CheckKind::DuplicateMetaTitles,
        CheckKind::MissingMetaDescription,
        CheckKind::MissingAltText,
        CheckKind::BrokenLinks,
        CheckKind::MixedContent,
        CheckKind::UnindexableContent,
    ];

    /// The fixed kind-to-severity mapping. A property of the check type,
    /// not of any single finding.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            CheckKind::MissingMetaTitle | CheckKind::BrokenLinks => Severity::Critical,
            CheckKind::DuplicateMetaTitles
            | CheckKind::MissingMetaDescription
            | CheckKind::MixedContent => Severity::High,
            CheckKind::MissingAltText => Severity::Medium,
            CheckKind::UnindexableContent => Severity::Low,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::MissingMetaTitle => "missing_meta_title",
            CheckKind::DuplicateMetaTitles => "duplicate_meta_titles",
            CheckKind::MissingMetaDescription => "missing_meta_description",
            CheckKind::MissingAltText => "missing_alt_text",
            CheckKind::BrokenLinks => "broken_links",
            CheckKind::MixedContent => "mixed_content",
            CheckKind::UnindexableContent => "unindexable_content",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        CheckKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl AuditStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Pending => "pending",
            AuditStatus::Running => "running",
            AuditStatus::Completed => "completed",
            AuditStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AuditStatus::Pending),
            "running" => Some(AuditStatus::Running),
            "completed" => Some(AuditStatus::Completed),
            "failed" => Some(AuditStatus::Failed),
            _ => None,
        }
    }

    /// Completed and failed audits never transition again; a new audit is a
    /// new record.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, AuditStatus::Completed | AuditStatus::Failed)
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three auditable content types a store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Product,
    Collection,
    Page,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Product,
        ResourceKind::Collection,
        ResourceKind::Page,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Product => "product",
            ResourceKind::Collection => "collection",
            ResourceKind::Page => "page",
        }
    }

    /// Human label used in issue messages ("Product", "Collection", "Page").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Product => "Product",
            ResourceKind::Collection => "Collection",
            ResourceKind::Page => "Page",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_check_kind_round_trips_through_its_string_form() {
        for kind in CheckKind::ALL {
            assert_eq!(CheckKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn severity_mapping_is_fixed_per_kind() {
        assert_eq!(CheckKind::MissingMetaTitle.severity(), Severity::Critical);
        assert_eq!(CheckKind::DuplicateMetaTitles.severity(), Severity::High);
        assert_eq!(
            CheckKind::MissingMetaDescription.severity(),
            Severity::High
        );
        assert_eq!(CheckKind::MissingAltText.severity(), Severity::Medium);
        assert_eq!(CheckKind::BrokenLinks.severity(), Severity::Critical);
        assert_eq!(CheckKind::MixedContent.severity(), Severity::High);
        assert_eq!(CheckKind::UnindexableContent.severity(), Severity::Low);
    }

    #[test]
    fn terminal_statuses_are_completed_and_failed() {
        assert!(!AuditStatus::Pending.is_terminal());
        assert!(!AuditStatus::Running.is_terminal());
        assert!(AuditStatus::Completed.is_terminal());
        assert!(AuditStatus::Failed.is_terminal());
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert_eq!(AuditStatus::parse("queued"), None);
        assert_eq!(AuditStatus::parse("running"), Some(AuditStatus::Running));
    }

    #[test]
    fn severity_serializes_to_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).expect("serialize");
        assert_eq!(json, "\"critical\"");
    }
}
