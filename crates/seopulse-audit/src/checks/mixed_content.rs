//! Mixed content check.

use std::sync::OnceLock;

use regex::Regex;
use seopulse_core::CheckKind;

use crate::types::{ContentSnapshot, Issue};

/// `href`/`src` attributes pointing at plain-HTTP URLs inside stored HTML.
fn insecure_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(?:href|src)\s*=\s*["'](http://[^"']+)["']"#)
            .expect("insecure ref pattern is valid")
    })
}

/// Extracts every plain-HTTP reference from an HTML fragment.
fn insecure_refs(html: &str) -> Vec<String> {
    insecure_ref_pattern()
        .captures_iter(html)
        .map(|captures| captures[1].to_owned())
        .collect()
}

/// Flags resources whose body references `http://` assets or links. Stores
/// are served over HTTPS, so each such reference triggers browser mixed
/// content warnings and dilutes the page's trust signals. One merged issue
/// per resource, with up to three sample URLs in the detail payload.
pub(super) fn find(snapshot: &ContentSnapshot) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();

    for resource in snapshot.iter_all() {
        let Some(body) = resource.body_html.as_deref() else {
            continue;
        };
        let refs = insecure_refs(body);
        if refs.is_empty() {
            continue;
        }

        let samples: Vec<&str> = refs.iter().take(3).map(String::as_str).collect();
        issues.push(
            Issue::new(
                CheckKind::MixedContent,
                resource,
                format!(
                    "{} \"{}\" references {} insecure (http://) resource(s)",
                    resource.kind.label(),
                    resource.title,
                    refs.len()
                ),
                "Serve all linked assets over https:// to avoid browser mixed \
                 content warnings",
            )
            .with_detail(serde_json::json!({
                "insecure_count": refs.len(),
                "samples": samples,
            })),
        );
    }

    issues
}
