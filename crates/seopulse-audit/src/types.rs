//! In-memory content snapshot and finding types used by the check battery.

use seopulse_content::{ApiCollection, ApiImage, ApiPage, ApiProduct};
use seopulse_core::{CheckKind, ResourceKind, Severity};
use seopulse_db::NewIssue;

/// One image attached to a resource.
#[derive(Debug, Clone)]
pub struct ResourceImage {
    pub src: String,
    pub alt: Option<String>,
}

/// Unified view of one auditable content item: product, collection, or
/// page. Built once by the content fetcher; read-only for the duration of
/// the audit run.
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: ResourceKind,
    pub id: i64,
    pub title: String,
    pub handle: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub body_html: Option<String>,
    pub images: Vec<ResourceImage>,
}

/// Treats `None`, empty, and whitespace-only as equally absent; all three
/// spellings occur in the wild.
fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl Resource {
    #[must_use]
    pub fn from_product(product: ApiProduct) -> Self {
        Self {
            kind: ResourceKind::Product,
            id: product.id,
            title: product.title,
            handle: product.handle,
            seo_title: product.seo_title,
            seo_description: product.seo_description,
            body_html: product.body_html,
            images: product
                .images
                .into_iter()
                .map(|image: ApiImage| ResourceImage {
                    src: image.src,
                    alt: image.alt,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn from_collection(collection: ApiCollection) -> Self {
        Self {
            kind: ResourceKind::Collection,
            id: collection.id,
            title: collection.title,
            handle: collection.handle,
            seo_title: collection.seo_title,
            seo_description: collection.seo_description,
            body_html: collection.body_html,
            images: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_page(page: ApiPage) -> Self {
        Self {
            kind: ResourceKind::Page,
            id: page.id,
            title: page.title,
            handle: page.handle,
            seo_title: page.seo_title,
            seo_description: page.seo_description,
            body_html: page.body_html,
            images: Vec::new(),
        }
    }

    /// Canonical storefront URL of this resource under the store origin.
    /// Also the durable key resources are upserted by.
    #[must_use]
    pub fn storefront_url(&self, origin: &str) -> String {
        let path = match self.kind {
            ResourceKind::Product => "products",
            ResourceKind::Collection => "collections",
            ResourceKind::Page => "pages",
        };
        format!("{origin}/{path}/{handle}", handle = self.handle)
    }

    #[must_use]
    pub fn has_seo_title(&self) -> bool {
        !is_blank(self.seo_title.as_deref())
    }

    #[must_use]
    pub fn has_seo_description(&self) -> bool {
        !is_blank(self.seo_description.as_deref())
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        !is_blank(self.body_html.as_deref())
    }
}

/// The immutable content set one audit runs against.
#[derive(Debug, Clone, Default)]
pub struct ContentSnapshot {
    pub products: Vec<Resource>,
    pub collections: Vec<Resource>,
    pub pages: Vec<Resource>,
    /// Resource kinds whose pagination stopped early; checks still run over
    /// whatever was gathered.
    pub incomplete: Vec<ResourceKind>,
}

impl ContentSnapshot {
    /// All resources across the three types, products first.
    pub fn iter_all(&self) -> impl Iterator<Item = &Resource> {
        self.products
            .iter()
            .chain(self.collections.iter())
            .chain(self.pages.iter())
    }

    #[must_use]
    pub fn total_resources(&self) -> usize {
        self.products.len() + self.collections.len() + self.pages.len()
    }
}

/// One finding produced by a single check against one resource.
#[derive(Debug, Clone)]
pub struct Issue {
    pub check: CheckKind,
    pub severity: Severity,
    pub resource_kind: ResourceKind,
    pub resource_id: i64,
    pub resource_title: String,
    pub resource_handle: String,
    pub message: String,
    pub suggestion: String,
    pub detail: Option<serde_json::Value>,
}

impl Issue {
    /// Builds an issue against `resource`; the severity comes from the
    /// check's fixed mapping.
    #[must_use]
    pub fn new(
        check: CheckKind,
        resource: &Resource,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            check,
            severity: check.severity(),
            resource_kind: resource.kind,
            resource_id: resource.id,
            resource_title: resource.title.clone(),
            resource_handle: resource.handle.clone(),
            message: message.into(),
            suggestion: suggestion.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Converts into the persistence shape.
    #[must_use]
    pub fn into_record(self) -> NewIssue {
        NewIssue {
            check_kind: self.check,
            severity: self.severity,
            resource_kind: self.resource_kind,
            resource_id: self.resource_id,
            resource_title: self.resource_title,
            resource_handle: self.resource_handle,
            message: self.message,
            suggestion: self.suggestion,
            detail: self.detail,
        }
    }
}

/// Fan-in result of one check: the battery always yields exactly one
/// outcome per check kind, with `error` set when the check's task failed
/// instead of letting the failure cancel its siblings.
#[derive(Debug)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub issues: Vec<Issue>,
    pub error: Option<String>,
}
