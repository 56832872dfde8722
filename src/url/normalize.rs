use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes an item URL collected from a feed page
///
/// Listings carry their stable identifier in the path, so everything from
/// the first `?` on is dropped. Surrounding whitespace is trimmed. URLs
/// without a query string are returned unchanged.
///
/// # Examples
///
/// ```
/// use marketplace_harvester::url::normalize_item_url;
///
/// let url = normalize_item_url("https://www.ebay.com/itm/123456789012?hash=item1c&var=0");
/// assert_eq!(url, "https://www.ebay.com/itm/123456789012");
/// ```
pub fn normalize_item_url(url: &str) -> String {
    let url = url.trim();
    match url.find('?') {
        Some(cut) => url[..cut].to_string(),
        None => url.to_string(),
    }
}

/// Derives the item identifier from a normalized item URL
///
/// The identifier is the last non-empty path segment, so
/// `https://www.ebay.com/itm/123456789012` and
/// `https://www.ebay.com/itm/some-title/123456789012/` both yield
/// `123456789012`. Characters outside `[A-Za-z0-9_-]` are replaced with `_`
/// so the id is always safe to embed in a record key or file name.
///
/// # Arguments
///
/// * `url` - The item URL (query string already removed)
///
/// # Returns
///
/// * `Ok(String)` - The derived item id
/// * `Err(UrlError)` - The URL does not parse or has no usable path segment
pub fn derive_item_id(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| UrlError::MissingItemId(url.to_string()))?;

    Ok(segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect())
}
