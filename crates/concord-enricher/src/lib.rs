//! Concord Link Enricher
//!
//! Turns the repository and web page links found on registry entries into
//! evidence records the oracle can read.
//!
//! # Pipeline
//!
//! 1. Resolve redirects (HEAD, redirects followed)
//! 2. [`classify`] the final URL into a [`LinkSource`]
//! 3. Run that source's strategy (forge APIs, PyPI JSON, rendered pages)
//!
//! Per-field failures are recorded as `Fetch::Failed` and logged; a URL
//! never aborts the batch it belongs to.
//!
//! # Features
//!
//! - `browser`: render SourceForge and generic pages in headless Chromium.
//!   Without it pages are fetched over HTTP and scripts do not run.

#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod enricher;
pub mod error;
pub mod html;
pub mod render;
pub mod sources;

pub use classify::{classify, LinkSource};
pub use config::EnricherConfig;
pub use enricher::Enricher;
pub use error::EnrichError;
pub use render::{HttpRenderer, PageRenderer};

#[cfg(feature = "browser")]
pub use render::ChromiumRenderer;
