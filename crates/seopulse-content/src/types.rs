//! Response types for the store content API.
//!
//! The platform exposes three JSON list endpoints per store
//! (`products.json`, `collections.json`, `pages.json`), each paginated with a `Link`
//! response header carrying a `page_info` cursor. Field presence varies by
//! store age and platform version, so optional fields default rather than
//! failing deserialization:
//!
//! - `status` may be absent on older stores; treat missing as `"active"`.
//! - `seo_title` / `seo_description` are empty strings on some stores and
//!   `null` on others; both spellings mean "not set".
//! - `images[].alt` is `null` (not omitted) when the merchant never filled
//!   it in.

use serde::Deserialize;

/// Top-level response from `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<ApiProduct>,
}

/// Top-level response from `GET /collections.json`.
#[derive(Debug, Deserialize)]
pub struct CollectionsPage {
    pub collections: Vec<ApiCollection>,
}

/// Top-level response from `GET /pages.json`.
#[derive(Debug, Deserialize)]
pub struct PagesPage {
    pub pages: Vec<ApiPage>,
}

/// One product as returned by the content API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProduct {
    /// Platform-assigned numeric id.
    pub id: i64,

    /// Display name of the product.
    pub title: String,

    /// URL slug of the product page.
    pub handle: String,

    /// Raw HTML description. May be `null` or absent.
    #[serde(default)]
    pub body_html: Option<String>,

    /// Publication status; absent on older stores, defaulted to active
    /// downstream.
    #[serde(default)]
    pub status: Option<String>,

    /// Meta title as configured in the store's SEO settings.
    #[serde(default)]
    pub seo_title: Option<String>,

    /// Meta description as configured in the store's SEO settings.
    #[serde(default)]
    pub seo_description: Option<String>,

    /// Full image gallery.
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

/// One collection as returned by the content API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCollection {
    pub id: i64,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
}

/// One content page as returned by the content API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPage {
    pub id: i64,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
}

/// A product image.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiImage {
    #[serde(default)]
    pub id: Option<i64>,
    /// Canonical CDN URL.
    pub src: String,
    /// Merchant-entered alt text; `null` when never set.
    #[serde(default)]
    pub alt: Option<String>,
}
