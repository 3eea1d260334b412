//! Concord Domain Layer
//!
//! This crate contains the data model shared by every stage of the
//! duplicate-resolution pipeline, plus the trait seams behind which the
//! external collaborators (link sources, the oracle, tokenizers) live.
//!
//! ## Key Concepts
//!
//! - **SoftwareEntry**: An immutable registry snapshot with descriptive fields and references
//! - **ConflictGroup**: Entries under evaluation (`disconnected`) plus known-same anchors (`remaining`)
//! - **EvidenceRecord**: What one external URL told us, field by field
//! - **FullConflict**: Reference-stripped entries plus chunked evidence keyed by URL
//! - **Message / Prompt**: The ordered request sent to the oracle
//! - **ResolutionResult**: The structured verdict parsed from the oracle's answer
//!
//! ## Architecture
//!
//! - Serialization shapes live here so every crate reads and writes the same files
//! - No I/O: infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod evidence;
pub mod message;
pub mod resolution;
pub mod traits;

// Re-exports for convenience
pub use entry::{
    Cluster, ConflictGroup, ConflictSet, GroupedEntries, RepositoryKind, RepositoryRef, SoftwareEntry,
};
pub use evidence::{labels, EvidenceRecord, Fetch, FullConflict, WebpageContents};
pub use message::{Message, Prompt, Role};
pub use resolution::{Confidence, OracleReply, ResolutionResult, UsageMetadata, Verdict};
pub use traits::{LinkEnricher, Oracle, TokenCounter};
