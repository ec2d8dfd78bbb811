//! Unindexable / orphan content check.

use seopulse_core::CheckKind;

use crate::types::{ContentSnapshot, Issue};

/// Flags resources that give crawlers nothing to index: no meta title, no
/// meta description, and no body content. Such resources exist in the
/// catalog but are effectively invisible to search.
pub(super) fn find(snapshot: &ContentSnapshot) -> Vec<Issue> {
    snapshot
        .iter_all()
        .filter(|resource| {
            !resource.has_seo_title() && !resource.has_seo_description() && !resource.has_body()
        })
        .map(|resource| {
            Issue::new(
                CheckKind::UnindexableContent,
                resource,
                format!(
                    "{} \"{}\" has no meta title, no meta description, and no body \
                     content, so it is unlikely to be indexed",
                    resource.kind.label(),
                    resource.title
                ),
                "Add body content and SEO metadata, or unpublish the resource if \
                 it is not meant to be found",
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::tests::product;
    use super::*;

    #[test]
    fn flags_only_fully_empty_resources() {
        let mut empty = product(1, "Ghost");
        empty.seo_title = None;
        empty.seo_description = None;
        empty.body_html = None;

        let mut body_only = product(2, "Body Only");
        body_only.seo_title = None;
        body_only.seo_description = None;
        // body_html stays set: enough to be indexable.

        let snapshot = ContentSnapshot {
            products: vec![empty, body_only],
            ..ContentSnapshot::default()
        };

        let issues = find(&snapshot);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].resource_id, 1);
        assert_eq!(issues[0].check, CheckKind::UnindexableContent);
    }
}
