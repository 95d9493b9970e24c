//! Shared User-Agent string for page and document requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/docharvest";

/// Default User-Agent for all requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("docharvest/{version} (document-harvester; +{PROJECT_UA_URL})")
}
