//! HTTP client for the store content API's list endpoints.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ContentError;
use crate::pagination::next_page_cursor;
use crate::retry::with_backoff;
use crate::types::{ApiCollection, ApiPage, ApiProduct, CollectionsPage, PagesPage, ProductsPage};

/// Maximum number of pages to fetch per resource type before giving up.
/// Guards against cycling cursors; with the default page size of 250 this
/// still allows 50k items, far beyond any plan cap.
pub(crate) const MAX_PAGES: usize = 200;

/// The accumulated result of draining one resource type's pages.
///
/// `error` is `Some` when pagination stopped early; the items gathered
/// before the failure are still returned so callers can degrade gracefully
/// instead of discarding a partially fetched catalog.
#[derive(Debug)]
pub struct Drained<T> {
    pub items: Vec<T>,
    pub error: Option<ContentError>,
}

impl<T> Drained<T> {
    /// `true` when every page of the type was fetched without error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Client for a store's `products.json` / `collections.json` / `pages.json`
/// endpoints.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors, and extracts `Link`-header cursors for multi-page fetches.
/// Transient errors (429, network failures) are retried with exponential
/// backoff up to `max_retries` additional attempts.
pub struct ContentClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ContentClient {
    /// Creates a `ContentClient` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Normalizes a store domain into an HTTPS origin.
    ///
    /// Accepts a bare domain (`shop.example.com`) or a full URL; trailing
    /// slashes are stripped. Plain-HTTP origins are kept as given so local
    /// test servers work.
    #[must_use]
    pub fn store_origin(domain: &str) -> String {
        let trimmed = domain.trim().trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        }
    }

    /// Fetches one page of products, filtered server-side to active status.
    ///
    /// Returns the parsed page plus the raw `Link` header for cursor
    /// extraction.
    ///
    /// # Errors
    ///
    /// - [`ContentError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ContentError::NotFound`] — HTTP 404 (not retried).
    /// - [`ContentError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`ContentError::Http`] — network failure after all retries exhausted.
    /// - [`ContentError::Deserialize`] — body is not a valid products page.
    pub async fn fetch_products_page(
        &self,
        domain: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<(ProductsPage, Option<String>), ContentError> {
        let url = Self::endpoint_url(domain, "products.json", limit, cursor, true)?;
        self.fetch_page(domain, url, "products page").await
    }

    /// Fetches one page of collections.
    ///
    /// # Errors
    ///
    /// Same error surface as [`Self::fetch_products_page`].
    pub async fn fetch_collections_page(
        &self,
        domain: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<(CollectionsPage, Option<String>), ContentError> {
        let url = Self::endpoint_url(domain, "collections.json", limit, cursor, false)?;
        self.fetch_page(domain, url, "collections page").await
    }

    /// Fetches one page of content pages.
    ///
    /// # Errors
    ///
    /// Same error surface as [`Self::fetch_products_page`].
    pub async fn fetch_pages_page(
        &self,
        domain: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<(PagesPage, Option<String>), ContentError> {
        let url = Self::endpoint_url(domain, "pages.json", limit, cursor, false)?;
        self.fetch_page(domain, url, "pages page").await
    }

    /// Drains every product page up to `max_items`, following `Link` cursors.
    ///
    /// A page failure mid-drain stops pagination for this type and returns
    /// the items accumulated so far with the error attached; a partial
    /// catalog is more useful to the audit than none.
    pub async fn drain_products(
        &self,
        domain: &str,
        page_size: u32,
        max_items: usize,
        inter_request_delay_ms: u64,
    ) -> Drained<ApiProduct> {
        let mut items: Vec<ApiProduct> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > MAX_PAGES {
                return Drained {
                    items,
                    error: Some(ContentError::PaginationLimit {
                        origin: Self::store_origin(domain),
                        max_pages: MAX_PAGES,
                    }),
                };
            }

            if pages > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            match self
                .fetch_products_page(domain, page_size, cursor.as_deref())
                .await
            {
                Ok((page, link)) => {
                    items.extend(page.products);
                    cursor = next_page_cursor(link.as_deref());
                }
                Err(err) => {
                    tracing::warn!(
                        domain,
                        fetched = items.len(),
                        error = %err,
                        "product pagination stopped early"
                    );
                    items.truncate(max_items);
                    return Drained {
                        items,
                        error: Some(err),
                    };
                }
            }

            if cursor.is_none() || items.len() >= max_items {
                break;
            }
        }

        items.truncate(max_items);
        Drained { items, error: None }
    }

    /// Drains every collection page up to `max_items`. Same partial-failure
    /// semantics as [`Self::drain_products`].
    pub async fn drain_collections(
        &self,
        domain: &str,
        page_size: u32,
        max_items: usize,
        inter_request_delay_ms: u64,
    ) -> Drained<ApiCollection> {
        let mut items: Vec<ApiCollection> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > MAX_PAGES {
                return Drained {
                    items,
                    error: Some(ContentError::PaginationLimit {
                        origin: Self::store_origin(domain),
                        max_pages: MAX_PAGES,
                    }),
                };
            }

            if pages > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            match self
                .fetch_collections_page(domain, page_size, cursor.as_deref())
                .await
            {
                Ok((page, link)) => {
                    items.extend(page.collections);
                    cursor = next_page_cursor(link.as_deref());
                }
                Err(err) => {
                    tracing::warn!(
                        domain,
                        fetched = items.len(),
                        error = %err,
                        "collection pagination stopped early"
                    );
                    items.truncate(max_items);
                    return Drained {
                        items,
                        error: Some(err),
                    };
                }
            }

            if cursor.is_none() || items.len() >= max_items {
                break;
            }
        }

        items.truncate(max_items);
        Drained { items, error: None }
    }

    /// Drains every content page up to `max_items`. Same partial-failure
    /// semantics as [`Self::drain_products`].
    pub async fn drain_pages(
        &self,
        domain: &str,
        page_size: u32,
        max_items: usize,
        inter_request_delay_ms: u64,
    ) -> Drained<ApiPage> {
        let mut items: Vec<ApiPage> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > MAX_PAGES {
                return Drained {
                    items,
                    error: Some(ContentError::PaginationLimit {
                        origin: Self::store_origin(domain),
                        max_pages: MAX_PAGES,
                    }),
                };
            }

            if pages > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            match self
                .fetch_pages_page(domain, page_size, cursor.as_deref())
                .await
            {
                Ok((page, link)) => {
                    items.extend(page.pages);
                    cursor = next_page_cursor(link.as_deref());
                }
                Err(err) => {
                    tracing::warn!(
                        domain,
                        fetched = items.len(),
                        error = %err,
                        "page pagination stopped early"
                    );
                    items.truncate(max_items);
                    return Drained {
                        items,
                        error: Some(err),
                    };
                }
            }

            if cursor.is_none() || items.len() >= max_items {
                break;
            }
        }

        items.truncate(max_items);
        Drained { items, error: None }
    }

    /// Issues one GET with retry, maps status codes to typed errors, and
    /// parses the body as `P`.
    async fn fetch_page<P: DeserializeOwned>(
        &self,
        domain: &str,
        url: String,
        context: &str,
    ) -> Result<(P, Option<String>), ContentError> {
        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        with_backoff(max_retries, backoff_base_secs, || {
            let url = url.clone();
            let domain = domain.to_owned();
            let context = context.to_owned();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ContentError::RateLimited {
                        domain,
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ContentError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ContentError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                // Grab the Link header before consuming the body.
                let link_header = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);

                let body = response.text().await?;
                let parsed =
                    serde_json::from_str::<P>(&body).map_err(|e| ContentError::Deserialize {
                        context: format!("{context} from {domain}"),
                        source: e,
                    })?;

                Ok((parsed, link_header))
            }
        })
        .await
    }

    /// Builds the URL for one list endpoint, page size, and optional cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidDomain`] if the normalized origin is
    /// not a parseable URL base.
    fn endpoint_url(
        domain: &str,
        path: &str,
        limit: u32,
        cursor: Option<&str>,
        active_only: bool,
    ) -> Result<String, ContentError> {
        let origin = Self::store_origin(domain);
        let base = format!("{origin}/{path}");
        let mut url =
            reqwest::Url::parse(&base).map_err(|e| ContentError::InvalidDomain {
                domain: domain.to_owned(),
                reason: format!("origin \"{origin}\" is not a valid URL base: {e}"),
            })?;

        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        if active_only {
            url.query_pairs_mut().append_pair("status", "active");
        }
        if let Some(cursor) = cursor {
            url.query_pairs_mut().append_pair("page_info", cursor);
        }

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_origin_prepends_https_to_bare_domain() {
        assert_eq!(
            ContentClient::store_origin("shop.example.com"),
            "https://shop.example.com"
        );
    }

    #[test]
    fn store_origin_keeps_explicit_scheme_and_strips_trailing_slash() {
        assert_eq!(
            ContentClient::store_origin("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn endpoint_url_includes_limit_and_status_filter() {
        let url =
            ContentClient::endpoint_url("shop.example.com", "products.json", 250, None, true)
                .expect("valid url");
        assert!(url.starts_with("https://shop.example.com/products.json?"));
        assert!(url.contains("limit=250"));
        assert!(url.contains("status=active"));
    }

    #[test]
    fn endpoint_url_appends_cursor_when_present() {
        let url = ContentClient::endpoint_url(
            "shop.example.com",
            "pages.json",
            50,
            Some("cursor-xyz"),
            false,
        )
        .expect("valid url");
        assert!(url.contains("page_info=cursor-xyz"));
        assert!(!url.contains("status=active"));
    }

    #[test]
    fn endpoint_url_rejects_unparseable_origin() {
        let result = ContentClient::endpoint_url("exa mple.com", "products.json", 1, None, false);
        assert!(matches!(result, Err(ContentError::InvalidDomain { .. })));
    }
}
