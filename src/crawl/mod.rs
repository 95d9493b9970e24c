//! Page iteration and the sequential harvest loop.

mod error;
mod orchestrator;
mod page_source;

pub use error::HarvestError;
pub use orchestrator::{Harvester, RunStats};
pub use page_source::{ApiPageSource, PageEndpoint, PageSource, PageSourceError};
