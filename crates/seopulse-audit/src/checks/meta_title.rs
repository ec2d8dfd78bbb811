//! Missing meta title check.

use seopulse_core::CheckKind;

use crate::types::{ContentSnapshot, Issue};

/// Flags every resource whose meta title is empty or whitespace. The meta
/// title is the single highest-leverage on-page signal, which is why this
/// check carries the battery's top severity.
pub(super) fn find(snapshot: &ContentSnapshot) -> Vec<Issue> {
    snapshot
        .iter_all()
        .filter(|resource| !resource.has_seo_title())
        .map(|resource| {
            Issue::new(
                CheckKind::MissingMetaTitle,
                resource,
                format!(
                    "{} \"{}\" has no meta title",
                    resource.kind.label(),
                    resource.title
                ),
                "Write a unique, descriptive meta title of 50-60 characters that \
                 includes the primary keyword",
            )
        })
        .collect()
}
