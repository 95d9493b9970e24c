//! Results-page parsing.
//!
//! Turns the raw JSON of one results page into a flat, deduplicated list of
//! [`DownloadItem`]s. Malformed pages are reported as [`ParseError`] so the
//! caller can skip the page; malformed URLs inside a page are dropped.

mod error;
mod page;

pub use error::ParseError;
pub use page::{DownloadItem, extract_download_items, validate_download_url};
