//! Missing meta description check.

use seopulse_core::CheckKind;

use crate::types::{ContentSnapshot, Issue};

/// Flags every resource whose meta description is empty or whitespace.
pub(super) fn find(snapshot: &ContentSnapshot) -> Vec<Issue> {
    snapshot
        .iter_all()
        .filter(|resource| !resource.has_seo_description())
        .map(|resource| {
            Issue::new(
                CheckKind::MissingMetaDescription,
                resource,
                format!(
                    "{} \"{}\" has no meta description",
                    resource.kind.label(),
                    resource.title
                ),
                "Write a compelling meta description of 150-160 characters; it is \
                 the snippet searchers see under the title",
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::tests::product;
    use super::*;

    #[test]
    fn flags_resources_without_a_description() {
        let mut missing = product(1, "Quiet Product");
        missing.seo_description = None;
        let fine = product(2, "Loud Product");

        let snapshot = ContentSnapshot {
            products: vec![missing, fine],
            ..ContentSnapshot::default()
        };

        let issues = find(&snapshot);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].resource_id, 1);
        assert_eq!(issues[0].check, CheckKind::MissingMetaDescription);
    }
}
