//! Error types for oracle providers

use thiserror::Error;

/// Errors that can occur while querying the oracle
///
/// Only [`OracleError::is_transient`] errors are retried. Once retries are
/// exhausted, providers degrade to an empty reply instead of returning them.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code returned
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Required credential not set in the environment
    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    /// Endpoint could not be built
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure injected by the mock oracle
    #[error("Mock error: {0}")]
    Mock(String),
}

impl OracleError {
    /// True for failures worth another attempt: transport errors, 429, 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            OracleError::Communication(_) => true,
            OracleError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let status = |status| OracleError::Status {
            status,
            body: String::new(),
        };
        assert!(status(429).is_transient());
        assert!(status(503).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(401).is_transient());
        assert!(!OracleError::MissingCredentials("OPENROUTER_API_KEY").is_transient());
    }
}
