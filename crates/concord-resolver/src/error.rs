//! Error types for the resolution workflow

use concord_assembler::{AssemblyError, ParseError};
use concord_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur while resolving conflicts
///
/// Errors scoped to one conflict are recorded and the batch continues;
/// only setup failures (configuration, unreadable ledger) abort a run.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Assembly or message building failed (including the token ceiling)
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// The oracle request could not be issued
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// The oracle answer held no structured result
    #[error("Unparsable answer: {0}")]
    Parse(#[from] ParseError),

    /// A pipeline file could not be read or written
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
