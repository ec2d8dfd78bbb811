//! Cursor extraction from the content API's `Link` response header.
//!
//! Each page response carries RFC 5988 style link directives; the next-page
//! cursor is the `page_info` query parameter of the `rel="next"` URL:
//!
//! ```text
//! <https://shop.example.com/products.json?limit=250&page_info=CURSOR>; rel="next"
//! ```
//!
//! The last page omits the `rel="next"` directive entirely.

/// Returns the `page_info` cursor for the next page, or `None` when the
/// header is absent, has no `rel="next"` directive, or the next URL carries
/// no `page_info` parameter.
#[must_use]
pub fn next_page_cursor(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    header
        .split(',')
        .map(str::trim)
        .filter(|directive| directive.contains(r#"rel="next""#))
        .find_map(|directive| {
            let url = bracketed_url(directive)?;
            query_value(url, "page_info")
        })
}

/// The URL between `<` and `>` in one link directive.
fn bracketed_url(directive: &str) -> Option<&str> {
    let start = directive.find('<')? + 1;
    let end = directive.find('>')?;
    (start < end).then(|| &directive[start..end])
}

/// The value of `name` in the URL's query string, if present.
fn query_value(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_owned())
    })
}
