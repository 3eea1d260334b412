//! Concord Ledger
//!
//! Durable files shared by the pipeline steps:
//!
//! - [`Ledger`]: resolved conflicts, consulted before any oracle call
//! - [`MessagesFile`]: prepared prompts awaiting inference
//! - [`ArtifactStore`]: raw answers and usage metadata per conflict
//! - [`ReviewQueue`] / [`ErrorLog`]: unclear verdicts and failed conflicts
//!
//! Every file is newline-delimited JSON, only ever appended to, one record
//! per `write_all` call. Concurrent writers stay safe as long as each
//! record is a single line.

#![warn(missing_docs)]

pub mod artifacts;
pub mod error;
pub mod jsonl;
pub mod ledger;
pub mod messages;
pub mod review;

pub use artifacts::{sanitize_key, ArtifactStore};
pub use error::LedgerError;
pub use jsonl::{append_line, read_lines, KeyedLog};
pub use ledger::Ledger;
pub use messages::MessagesFile;
pub use review::{ErrorLog, FailureRecord, ReviewQueue};
