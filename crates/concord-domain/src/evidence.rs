//! Evidence gathered from external links

use crate::entry::SoftwareEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Content labels used as keys inside [`WebpageContents`]
pub mod labels {
    /// Main text of a generic web page
    pub const CONTENT: &str = "Content";
    /// README of a repository
    pub const README: &str = "README content";
    /// Repository metadata from a forge API
    pub const REPOSITORY_METADATA: &str = "Repository metadata";
    /// Package or project metadata (PyPI, SourceForge)
    pub const PROJECT_METADATA: &str = "Project metadata";
}

/// Outcome of fetching one piece of evidence
///
/// Distinguishes "the source has nothing" from "we could not ask the source".
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    /// The source returned usable data
    Found(T),
    /// The source answered but had nothing to offer, or was never asked
    Absent,
    /// The request failed; the reason is kept for diagnostics
    Failed(String),
}

impl<T> Default for Fetch<T> {
    fn default() -> Self {
        Fetch::Absent
    }
}

impl<T> Fetch<T> {
    /// Borrow the payload if one was found
    pub fn found(&self) -> Option<&T> {
        match self {
            Fetch::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Take the payload if one was found
    pub fn into_found(self) -> Option<T> {
        match self {
            Fetch::Found(value) => Some(value),
            _ => None,
        }
    }

    /// True when the fetch errored
    pub fn is_failed(&self) -> bool {
        matches!(self, Fetch::Failed(_))
    }

    /// The failure reason, if any
    pub fn failure(&self) -> Option<&str> {
        match self {
            Fetch::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Map the payload, keeping absence and failure as they are
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetch<U> {
        match self {
            Fetch::Found(value) => Fetch::Found(f(value)),
            Fetch::Absent => Fetch::Absent,
            Fetch::Failed(reason) => Fetch::Failed(reason),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<Option<T>, E>> for Fetch<T> {
    fn from(result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(Some(value)) => Fetch::Found(value),
            Ok(None) => Fetch::Absent,
            Err(e) => Fetch::Failed(e.to_string()),
        }
    }
}

/// Everything one URL told us
///
/// Created per conflict and dropped after message assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceRecord {
    /// The URL as it appeared on the entry
    pub url: String,

    /// Repository metadata from a forge API
    pub repo_metadata: Fetch<Value>,

    /// Raw README text
    pub readme_content: Fetch<String>,

    /// Package / project metadata
    pub project_metadata: Fetch<Value>,

    /// Main text of a generic page, markdown-like
    pub content: Fetch<String>,
}

impl EvidenceRecord {
    /// A record for `url` with every field absent
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Failure reasons of every field that errored, labelled
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(reason) = self.repo_metadata.failure() {
            out.push((labels::REPOSITORY_METADATA, reason));
        }
        if let Some(reason) = self.readme_content.failure() {
            out.push((labels::README, reason));
        }
        if let Some(reason) = self.project_metadata.failure() {
            out.push((labels::PROJECT_METADATA, reason));
        }
        if let Some(reason) = self.content.failure() {
            out.push((labels::CONTENT, reason));
        }
        out
    }

    /// True when no field produced any evidence
    pub fn is_empty(&self) -> bool {
        self.repo_metadata.found().is_none()
            && self.readme_content.found().is_none()
            && self.project_metadata.found().is_none()
            && self.content.found().is_none()
    }
}

/// URL → content label → ordered text chunks
pub type WebpageContents = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// A conflict ready for message assembly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullConflict {
    /// Entries under evaluation, references stripped
    pub disconnected: Vec<SoftwareEntry>,

    /// Known-same anchors, references stripped
    pub remaining: Vec<SoftwareEntry>,

    /// Chunked evidence, at most one key per URL
    #[serde(default)]
    pub webpage_contents: WebpageContents,
}
