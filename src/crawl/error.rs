//! Run-level errors.
//!
//! Only setup problems end a run early. Page and item failures are logged and
//! counted in [`super::RunStats`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a harvest run before any page is processed.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl HarvestError {
    /// Creates an output directory error.
    pub fn output_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path.into(),
            source,
        }
    }
}
