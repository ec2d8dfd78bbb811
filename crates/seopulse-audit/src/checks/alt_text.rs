//! Missing image ALT text check.

use seopulse_core::CheckKind;

use crate::types::{ContentSnapshot, Issue};

/// Flags products whose images lack alt text. Findings for one product are
/// merged into a single issue carrying the count, so a gallery of twenty
/// bare images reads as one actionable item, not twenty rows.
pub(super) fn find(snapshot: &ContentSnapshot) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();

    for product in &snapshot.products {
        let missing = product
            .images
            .iter()
            .filter(|image| image.alt.as_deref().is_none_or(|alt| alt.trim().is_empty()))
            .count();
        if missing == 0 {
            continue;
        }

        issues.push(
            Issue::new(
                CheckKind::MissingAltText,
                product,
                format!(
                    "Product \"{}\" has {missing} image(s) without alt text",
                    product.title
                ),
                "Describe each image in a short alt attribute; alt text drives \
                 image search and accessibility",
            )
            .with_detail(serde_json::json!({
                "images_missing_alt": missing,
                "image_count": product.images.len(),
            })),
        );
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::super::tests::product;
    use super::*;
    use crate::types::ResourceImage;

    fn image(alt: Option<&str>) -> ResourceImage {
        ResourceImage {
            src: "https://cdn.example.com/img.jpg".to_owned(),
            alt: alt.map(str::to_owned),
        }
    }

    #[test]
    fn merges_all_bare_images_of_one_product_into_one_issue() {
        let mut p = product(1, "Gallery Product");
        p.images = vec![image(None), image(Some("")), image(Some("described"))];

        let snapshot = ContentSnapshot {
            products: vec![p],
            ..ContentSnapshot::default()
        };

        let issues = find(&snapshot);
        assert_eq!(issues.len(), 1, "one merged issue per product");
        let detail = issues[0].detail.as_ref().expect("detail");
        assert_eq!(detail["images_missing_alt"], 2);
        assert_eq!(detail["image_count"], 3);
        assert!(issues[0].message.contains("2 image(s)"));
    }

    #[test]
    fn fully_described_galleries_pass() {
        let mut p = product(1, "Good Product");
        p.images = vec![image(Some("front")), image(Some("back"))];

        let snapshot = ContentSnapshot {
            products: vec![p],
            ..ContentSnapshot::default()
        };

        assert!(find(&snapshot).is_empty());
    }

    #[test]
    fn products_without_images_are_ignored() {
        let snapshot = ContentSnapshot {
            products: vec![product(1, "Imageless")],
            ..ContentSnapshot::default()
        };
        assert!(find(&snapshot).is_empty());
    }
}
