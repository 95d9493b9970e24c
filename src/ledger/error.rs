//! Error types for the download ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or appending to the ledger file.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file exists but could not be read.
    #[error("failed to read ledger {path}: {source}")]
    Read {
        /// Ledger file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be appended.
    #[error("failed to append to ledger {path}: {source}")]
    Append {
        /// Ledger file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates an append error.
    pub fn append(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Append {
            path: path.into(),
            source,
        }
    }
}
