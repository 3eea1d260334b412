//! Error types for conflict assembly and result parsing

use thiserror::Error;

/// Errors that can occur while turning a conflict into oracle messages
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The assembled request is larger than the global token ceiling
    #[error("Prompt too long: {total} tokens (limit: {limit})")]
    BudgetExceeded {
        /// Summed tokens of all messages
        total: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// No instruction template exists for this partition shape
    #[error("Unsupported combination: {disconnected} disconnected, {remaining} remaining")]
    UnsupportedPartition {
        /// Size of the disconnected partition
        disconnected: usize,
        /// Size of the remaining partition
        remaining: usize,
    },

    /// Template missing, malformed, or failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// Tokenizer could not be loaded
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Template folder could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why an oracle answer yielded no structured result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The answer was empty
    #[error("Empty answer")]
    Empty,

    /// Nothing that looks like a JSON object was found
    #[error("No JSON object found in answer")]
    NoJsonFound,

    /// A candidate was found but is not valid JSON
    #[error("Failed to parse JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON that is not a resolution result (e.g. no verdict)
    #[error("Not a resolution result: {0}")]
    InvalidShape(String),
}
