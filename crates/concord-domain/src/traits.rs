//! Trait definitions for external interactions
//!
//! These traits define the boundaries between pipeline logic and the
//! outside world. Implementations live in other crates.

use crate::{EvidenceRecord, OracleReply, Prompt};
use async_trait::async_trait;

/// Resolves one URL into an evidence record
///
/// Implemented by the enrichment layer (concord-enricher)
#[async_trait]
pub trait LinkEnricher: Send + Sync {
    /// Enrich a single URL
    ///
    /// Never fails: source errors are recorded on the returned record's
    /// fields. Calls are independent and safe to retry.
    async fn enrich(&self, url: &str) -> EvidenceRecord;
}

/// The reasoning oracle that renders verdicts
///
/// Implemented by the provider layer (concord-llm)
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Error type for requests that cannot even be attempted
    type Error: std::fmt::Display + Send;

    /// Send a prompt to `model`
    ///
    /// Transient failures are retried inside the call and then degrade to
    /// [`OracleReply::empty`]; `Err` is reserved for requests that cannot
    /// be issued at all (missing credentials, malformed endpoint).
    async fn query(&self, prompt: &Prompt, model: &str) -> Result<OracleReply, Self::Error>;

    /// Requests-per-minute quota enforced by the provider, if any
    fn requests_per_minute(&self) -> Option<u32> {
        None
    }
}

/// Counts tokenizer units in a piece of text
///
/// Implemented by the budgeting layer (concord-assembler)
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`
    fn count(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}
