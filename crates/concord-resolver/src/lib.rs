//! Concord Resolver
//!
//! Drives disputed clusters from assembly to a recorded verdict. Three
//! entry points share the ledger and the oracle plumbing:
//!
//! - [`Workflow`] resolves clusters end to end and regroups their entries
//! - [`MessagePreparer`] writes prompts to a messages file for later
//! - [`InferenceRunner`] answers a prepared messages file
//!
//! Every entry point resumes: keys already in the ledger (or messages file)
//! are skipped, and a conflict that fails is left out so the next run
//! retries it.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod prepare;
pub mod remap;
pub mod state;
pub mod workflow;

pub use config::{OutputPaths, ResolverConfig};
pub use error::ResolverError;
pub use inference::InferenceRunner;
pub use metrics::ResolverMetrics;
pub use prepare::MessagePreparer;
pub use remap::InstanceIndex;
pub use state::ConflictState;
pub use workflow::{ResolutionRun, Workflow};
