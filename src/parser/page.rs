//! Download-item extraction from a results page.
//!
//! A page has the shape `{"results": [{"variants": [{"downloadUrl", "fileName"}]}]}`.
//! Every variant whose `downloadUrl` is an absolute http(s) URL with a host
//! becomes a [`DownloadItem`]; everything else is dropped silently.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, instrument, trace};
use url::Url;

use super::error::ParseError;

/// One candidate download: the URL to fetch and the name the upstream suggests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// Download URL exactly as it appeared in the page.
    pub url: String,
    /// Upstream-suggested file name (may be empty).
    pub suggested_name: String,
}

impl DownloadItem {
    /// Creates a new item.
    #[must_use]
    pub fn new(url: impl Into<String>, suggested_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            suggested_name: suggested_name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(default)]
    results: Option<Vec<ResultEntry>>,
}

#[derive(Debug, Deserialize)]
struct ResultEntry {
    #[serde(default)]
    variants: Option<Vec<Variant>>,
}

#[derive(Debug, Deserialize)]
struct Variant {
    #[serde(rename = "downloadUrl", default)]
    download_url: Option<String>,
    #[serde(rename = "fileName", default)]
    file_name: Option<String>,
}

/// Parses a raw results page into unique, valid download items.
///
/// Items keep page order. When two variants share a URL the first one wins,
/// including its suggested name.
///
/// # Errors
///
/// Returns [`ParseError::MalformedPage`] when the payload is not JSON of the
/// expected shape. Invalid URLs are never an error; those variants are dropped.
///
/// # Examples
///
/// ```
/// use docharvest_core::parser::extract_download_items;
///
/// let page = br#"{"results":[{"variants":[
///     {"downloadUrl":"https://example.com/a.pdf","fileName":"a.pdf"},
///     {"downloadUrl":"ftp://example.com/b.pdf","fileName":"b.pdf"}
/// ]}]}"#;
/// let items = extract_download_items(page).unwrap();
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].url, "https://example.com/a.pdf");
/// ```
#[instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn extract_download_items(raw: &[u8]) -> Result<Vec<DownloadItem>, ParseError> {
    let page: ResultSet =
        serde_json::from_slice(raw).map_err(|e| ParseError::malformed_page(&e))?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut items = Vec::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    let variants = page
        .results
        .unwrap_or_default()
        .into_iter()
        .flat_map(|entry| entry.variants.unwrap_or_default());

    for variant in variants {
        let url = variant.download_url.unwrap_or_default();
        if let Err(e) = validate_download_url(&url) {
            trace!(error = %e, "dropping variant");
            dropped += 1;
            continue;
        }
        if !seen.insert(url.clone()) {
            duplicates += 1;
            continue;
        }
        items.push(DownloadItem {
            url,
            suggested_name: variant.file_name.unwrap_or_default(),
        });
    }

    debug!(items = items.len(), dropped, duplicates, "extracted download items");
    Ok(items)
}

/// Validates a download URL.
///
/// # Validation rules:
/// - Must not be empty
/// - Must be an absolute URL parseable by the `url` crate
/// - Must use http or https scheme
/// - Must have a non-empty host
///
/// # Errors
///
/// Returns the first rule violated as a [`ParseError`].
pub fn validate_download_url(raw: &str) -> Result<(), ParseError> {
    if raw.is_empty() {
        return Err(ParseError::empty_url());
    }

    let parsed = Url::parse(raw).map_err(|e| ParseError::malformed(raw, &e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(ParseError::unsupported_scheme(raw, scheme)),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ParseError::no_host(raw));
    }

    Ok(())
}
