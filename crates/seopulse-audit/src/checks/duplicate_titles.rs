//! Duplicate meta title check.

use std::collections::HashMap;

use seopulse_core::CheckKind;

use crate::types::{ContentSnapshot, Issue, Resource};

/// Flags products and collections that share a normalized meta title.
///
/// Titles are compared case-insensitively after trimming; every member of a
/// colliding group gets its own issue, with the other members listed in the
/// detail payload so the merchant can see the whole collision at once.
/// Pages are exempt: landing pages legitimately reuse campaign titles.
pub(super) fn find(snapshot: &ContentSnapshot) -> Vec<Issue> {
    let mut groups: HashMap<String, Vec<&Resource>> = HashMap::new();

    for resource in snapshot.products.iter().chain(snapshot.collections.iter()) {
        let Some(title) = resource.seo_title.as_deref() else {
            continue;
        };
        let normalized = title.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        groups.entry(normalized).or_default().push(resource);
    }

    let mut issues: Vec<Issue> = Vec::new();
    for (normalized, members) in groups {
        if members.len() < 2 {
            continue;
        }
        for resource in &members {
            let colliders: Vec<&str> = members
                .iter()
                .filter(|other| {
                    (other.kind, other.id) != (resource.kind, resource.id)
                })
                .map(|other| other.handle.as_str())
                .collect();
            issues.push(
                Issue::new(
                    CheckKind::DuplicateMetaTitles,
                    resource,
                    format!(
                        "{} \"{}\" shares its meta title with {} other resource(s)",
                        resource.kind.label(),
                        resource.title,
                        colliders.len()
                    ),
                    "Give each product and collection a distinct meta title; \
                     duplicates compete against each other in search results",
                )
                .with_detail(serde_json::json!({
                    "shared_title": normalized,
                    "collides_with": colliders,
                })),
            );
        }
    }

    // HashMap iteration order is arbitrary; sort for stable reporting.
    issues.sort_by(|a, b| {
        (a.resource_kind.as_str(), a.resource_id).cmp(&(b.resource_kind.as_str(), b.resource_id))
    });
    issues
}
