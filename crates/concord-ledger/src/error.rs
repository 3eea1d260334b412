//! Error types for ledger and artifact files

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or appending pipeline files
#[derive(Error, Debug)]
pub enum LedgerError {
    /// File could not be read, created or appended to
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Conflict keys must be non-empty
    #[error("Invalid conflict key: {0:?}")]
    InvalidKey(String),
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }
}
