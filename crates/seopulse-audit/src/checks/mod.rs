//! The seven-check analysis battery.
//!
//! Checks are stateless functions over one immutable [`ContentSnapshot`];
//! none mutates shared state or reads another check's output, so the
//! battery runs all seven concurrently and joins them. Each check executes
//! in its own task: a check that dies (panics or is aborted) becomes an
//! outcome with `error` set and an empty issue list; it never cancels its
//! siblings and never fails the audit.

mod alt_text;
mod broken_links;
mod duplicate_titles;
mod indexability;
mod meta_description;
mod meta_title;
mod mixed_content;

use std::sync::Arc;
use std::time::Duration;

use seopulse_core::CheckKind;

use crate::types::{CheckOutcome, ContentSnapshot, Issue};

/// Shared, read-only context handed to every check. Only the broken-links
/// check uses the HTTP client today; the rest are pure.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub http: reqwest::Client,
    /// Upper bound on distinct URLs probed per audit.
    pub probe_limit: usize,
    /// Per-probe timeout.
    pub probe_timeout: Duration,
}

/// Runs all seven checks concurrently and fans their results back in.
///
/// Always returns exactly one [`CheckOutcome`] per [`CheckKind`], in
/// [`CheckKind::ALL`] order.
pub async fn run_battery(snapshot: Arc<ContentSnapshot>, ctx: CheckContext) -> Vec<CheckOutcome> {
    let handles: Vec<_> = CheckKind::ALL
        .into_iter()
        .map(|kind| {
            let snapshot = Arc::clone(&snapshot);
            let ctx = ctx.clone();
            (
                kind,
                tokio::spawn(async move { run_check(kind, &snapshot, &ctx).await }),
            )
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (kind, handle) in handles {
        match handle.await {
            Ok(issues) => outcomes.push(CheckOutcome {
                kind,
                issues,
                error: None,
            }),
            Err(join_err) => {
                tracing::error!(
                    check = %kind,
                    error = %join_err,
                    "check task died; recording empty result and continuing"
                );
                outcomes.push(CheckOutcome {
                    kind,
                    issues: Vec::new(),
                    error: Some(join_err.to_string()),
                });
            }
        }
    }
    outcomes
}

async fn run_check(kind: CheckKind, snapshot: &ContentSnapshot, ctx: &CheckContext) -> Vec<Issue> {
    match kind {
        CheckKind::MissingMetaTitle => meta_title::find(snapshot),
        CheckKind::DuplicateMetaTitles => duplicate_titles::find(snapshot),
        CheckKind::MissingMetaDescription => meta_description::find(snapshot),
        CheckKind::MissingAltText => alt_text::find(snapshot),
        CheckKind::BrokenLinks => broken_links::find(snapshot, ctx).await,
        CheckKind::MixedContent => mixed_content::find(snapshot),
        CheckKind::UnindexableContent => indexability::find(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seopulse_core::ResourceKind;

    use crate::types::Resource;

    pub(super) fn product(id: i64, title: &str) -> Resource {
        Resource {
            kind: ResourceKind::Product,
            id,
            title: title.to_owned(),
            handle: title.to_lowercase().replace(' ', "-"),
            seo_title: Some(format!("{title} meta")),
            seo_description: Some(format!("{title} description")),
            body_html: Some(format!("<p>{title}</p>")),
            images: Vec::new(),
        }
    }

    fn test_ctx() -> CheckContext {
        CheckContext {
            http: reqwest::Client::new(),
            probe_limit: 10,
            probe_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn battery_yields_one_outcome_per_check_in_fixed_order() {
        let snapshot = Arc::new(ContentSnapshot {
            products: vec![product(1, "Blue Shoe")],
            ..ContentSnapshot::default()
        });

        let outcomes = run_battery(snapshot, test_ctx()).await;

        assert_eq!(outcomes.len(), CheckKind::ALL.len());
        let kinds: Vec<CheckKind> = outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, CheckKind::ALL.to_vec());
        assert!(outcomes.iter().all(|o| o.error.is_none()));
    }

    #[tokio::test]
    async fn empty_snapshot_produces_no_issues() {
        let outcomes = run_battery(Arc::new(ContentSnapshot::default()), test_ctx()).await;
        assert!(outcomes.iter().all(|o| o.issues.is_empty()));
    }
}
