//! Error types for the CLI application.

use concord_assembler::AssemblyError;
use concord_enricher::EnrichError;
use concord_ledger::LedgerError;
use concord_llm::OracleError;
use concord_resolver::ResolverError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Enricher setup error
    #[error("Enricher error: {0}")]
    Enricher(#[from] EnrichError),

    /// Oracle setup error
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Template or tokenizer setup error
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Pipeline file error
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Resolution run error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
