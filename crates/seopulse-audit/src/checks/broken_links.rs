//! Broken link check.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use futures::future::join_all;
use regex::Regex;
use seopulse_core::CheckKind;

use super::CheckContext;
use crate::types::{ContentSnapshot, Issue, Resource};

/// Absolute `href` targets inside stored HTML. Relative links are skipped:
/// they resolve against storefront routing this pipeline cannot see.
fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*["'](https?://[^"']+)["']"#).expect("link pattern is valid")
    })
}

fn absolute_links(html: &str) -> Vec<String> {
    link_pattern()
        .captures_iter(html)
        .map(|captures| captures[1].to_owned())
        .collect()
}

/// Probes the links found in resource bodies and flags resources whose
/// links answer with an error status (or do not answer at all).
///
/// Each distinct URL is probed once per audit with a HEAD request, bounded
/// by `ctx.probe_limit`; links beyond the budget are skipped rather than
/// guessed at. Findings are merged per resource.
pub(super) async fn find(snapshot: &ContentSnapshot, ctx: &CheckContext) -> Vec<Issue> {
    let mut per_resource: Vec<(&Resource, Vec<String>)> = Vec::new();
    let mut probe_set: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for resource in snapshot.iter_all() {
        let Some(body) = resource.body_html.as_deref() else {
            continue;
        };
        let links = absolute_links(body);
        if links.is_empty() {
            continue;
        }
        for link in &links {
            if seen.insert(link.clone()) {
                probe_set.push(link.clone());
            }
        }
        per_resource.push((resource, links));
    }

    if probe_set.is_empty() {
        return Vec::new();
    }

    let skipped = probe_set.len().saturating_sub(ctx.probe_limit);
    if skipped > 0 {
        tracing::debug!(
            skipped,
            limit = ctx.probe_limit,
            "link probe budget reached; links beyond the budget are not checked this audit"
        );
    }
    probe_set.truncate(ctx.probe_limit);

    let results = join_all(probe_set.iter().map(|url| probe(ctx, url))).await;
    let verdicts: HashMap<&str, bool> = probe_set
        .iter()
        .map(String::as_str)
        .zip(results)
        .collect();

    let mut issues: Vec<Issue> = Vec::new();
    for (resource, links) in per_resource {
        let mut reported: HashSet<&str> = HashSet::new();
        let broken: Vec<&str> = links
            .iter()
            .map(String::as_str)
            .filter(|&link| verdicts.get(&link) == Some(&true) && reported.insert(link))
            .collect();
        if broken.is_empty() {
            continue;
        }

        issues.push(
            Issue::new(
                CheckKind::BrokenLinks,
                resource,
                format!(
                    "{} \"{}\" links to {} unreachable or erroring URL(s)",
                    resource.kind.label(),
                    resource.title,
                    broken.len()
                ),
                "Fix or remove links that no longer resolve; broken links hurt \
                 both crawlers and shoppers",
            )
            .with_detail(serde_json::json!({ "broken_links": broken })),
        );
    }

    issues
}

/// `true` when the link should be reported as broken.
async fn probe(ctx: &CheckContext, url: &str) -> bool {
    match ctx
        .http
        .head(url)
        .timeout(ctx.probe_timeout)
        .send()
        .await
    {
        Ok(response) => response.status().as_u16() >= 400,
        Err(err) => {
            tracing::debug!(url, error = %err, "link probe did not answer");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::product;
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx(probe_limit: usize) -> CheckContext {
        CheckContext {
            http: reqwest::Client::new(),
            probe_limit,
            probe_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn extracts_only_absolute_links() {
        let html = r#"<a href="https://example.com/a">a</a> <a href="/relative">r</a> <a href='http://example.com/b'>b</a>"#;
        assert_eq!(
            absolute_links(html),
            vec![
                "https://example.com/a".to_owned(),
                "http://example.com/b".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn flags_links_that_answer_with_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut p = product(1, "Linked Product");
        p.body_html = Some(format!(
            r#"<a href="{base}/ok">ok</a> <a href="{base}/missing">gone</a>"#,
            base = server.uri()
        ));

        let snapshot = ContentSnapshot {
            products: vec![p],
            ..ContentSnapshot::default()
        };

        let issues = find(&snapshot, &ctx(10)).await;
        assert_eq!(issues.len(), 1, "one merged issue for the resource");
        let detail = issues[0].detail.as_ref().expect("detail");
        let broken = detail["broken_links"].as_array().expect("array");
        assert_eq!(broken.len(), 1);
        assert!(broken[0].as_str().unwrap().ends_with("/missing"));
    }

    #[tokio::test]
    async fn probe_budget_caps_how_many_links_are_checked() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut p = product(1, "Busy Product");
        p.body_html = Some(format!(
            r#"<a href="{base}/one">1</a> <a href="{base}/two">2</a>"#,
            base = server.uri()
        ));

        let snapshot = ContentSnapshot {
            products: vec![p],
            ..ContentSnapshot::default()
        };

        let issues = find(&snapshot, &ctx(1)).await;
        let detail = issues[0].detail.as_ref().expect("detail");
        assert_eq!(
            detail["broken_links"].as_array().map(Vec::len),
            Some(1),
            "the unprobed link must not be guessed broken"
        );
    }

    #[tokio::test]
    async fn bodies_without_links_produce_nothing() {
        let snapshot = ContentSnapshot {
            products: vec![product(1, "Plain")],
            ..ContentSnapshot::default()
        };
        assert!(find(&snapshot, &ctx(10)).await.is_empty());
    }
}
