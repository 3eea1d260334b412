//! Error types for link enrichment

use thiserror::Error;

/// Errors raised while talking to one evidence source
///
/// These never escape [`crate::Enricher`]: they are folded into the
/// affected field of the evidence record as `Fetch::Failed`.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Status code returned
        status: u16,
    },

    /// URL could not be understood
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body was not in the expected shape
    #[error("Unexpected response: {0}")]
    Unexpected(String),

    /// Page rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
