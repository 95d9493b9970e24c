//! Error types for results-page parsing.

use thiserror::Error;

/// Errors that can occur while parsing a results page.
///
/// [`ParseError::MalformedPage`] is the only variant surfaced to callers; the
/// `InvalidUrl` variants describe why a single variant was dropped and are only
/// logged.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// Page payload is not valid JSON or does not match the results shape.
    #[error("malformed results page: {reason}")]
    MalformedPage {
        /// The decoder's description of the problem.
        reason: String,
    },

    /// A variant's download URL failed validation.
    #[error("invalid download URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL that failed validation
        url: String,
        /// Why the URL is invalid
        reason: String,
    },
}

impl ParseError {
    /// Creates a `MalformedPage` error from a JSON decode failure.
    #[must_use]
    pub fn malformed_page(source: &serde_json::Error) -> Self {
        Self::MalformedPage {
            reason: source.to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for an empty URL field.
    #[must_use]
    pub fn empty_url() -> Self {
        Self::InvalidUrl {
            url: String::new(),
            reason: "URL is empty".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a non-web URL scheme.
    #[must_use]
    pub fn unsupported_scheme(url: &str, scheme: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: format!("scheme '{scheme}' is not supported"),
        }
    }

    /// Creates an `InvalidUrl` error for a URL that does not parse.
    #[must_use]
    pub fn malformed(url: &str, parse_error: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: parse_error.to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a URL without a host.
    #[must_use]
    pub fn no_host(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        }
    }
}
