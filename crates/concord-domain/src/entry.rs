//! Registry entries and the conflict groups built from them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Hosting service a repository reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// github.com
    Github,
    /// gitlab.com
    Gitlab,
    /// bitbucket.org
    Bitbucket,
    /// Anything else (self-hosted forges, tarball pages, ...)
    #[serde(other)]
    Other,
}

impl Default for RepositoryKind {
    fn default() -> Self {
        RepositoryKind::Other
    }
}

impl RepositoryKind {
    /// Host substring a URL must contain to be trusted as this kind
    pub fn expected_host(&self) -> Option<&'static str> {
        match self {
            RepositoryKind::Github => Some("github.com"),
            RepositoryKind::Gitlab => Some("gitlab.com"),
            RepositoryKind::Bitbucket => Some("bitbucket.org"),
            RepositoryKind::Other => None,
        }
    }
}

/// A typed repository reference on a registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Repository URL
    #[serde(default)]
    pub url: String,

    /// Declared hosting service
    #[serde(default)]
    pub kind: RepositoryKind,
}

impl RepositoryRef {
    /// Create a new repository reference
    pub fn new(url: impl Into<String>, kind: RepositoryKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// True when the declared kind is a known forge and the URL really lives there
    pub fn is_hosted_repository(&self) -> bool {
        self.kind
            .expected_host()
            .map_or(false, |host| self.url.contains(host))
    }
}

/// Snapshot of one software entry taken from the registry
///
/// Descriptive fields are kept as raw JSON because the registry stores them
/// in several shapes (strings, lists, nested objects). Fields the pipeline
/// does not know about are preserved in `extra` and passed to the oracle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SoftwareEntry {
    /// Registry identifier
    #[serde(alias = "_id")]
    pub id: String,

    /// Software name
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub name: Value,

    /// Free-text description(s)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub description: Value,

    /// License information
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub license: Value,

    /// Author list
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub authors: Value,

    /// Publications describing the software
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub publication: Value,

    /// Upstream source(s) the entry was harvested from
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub source: Value,

    /// Repository references (evidentiary)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repository: Vec<RepositoryRef>,

    /// Web page references (evidentiary)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webpage: Vec<String>,

    /// Any other registry fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SoftwareEntry {
    /// Create an entry with only an identifier and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Value::String(name.into()),
            ..Default::default()
        }
    }

    /// Add a repository reference
    pub fn with_repository(mut self, url: impl Into<String>, kind: RepositoryKind) -> Self {
        self.repository.push(RepositoryRef::new(url, kind));
        self
    }

    /// Add a web page reference
    pub fn with_webpage(mut self, url: impl Into<String>) -> Self {
        self.webpage.push(url.into());
        self
    }

    /// Copy of this entry with the evidentiary reference lists removed
    ///
    /// The oracle only ever sees identity and descriptive fields; links are
    /// replaced by the evidence fetched from them.
    pub fn without_references(&self) -> SoftwareEntry {
        SoftwareEntry {
            repository: Vec::new(),
            webpage: Vec::new(),
            ..self.clone()
        }
    }
}

/// A cluster of entries suspected to describe the same software
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConflictGroup {
    /// Entries under evaluation
    #[serde(default)]
    pub disconnected: Vec<SoftwareEntry>,

    /// Entries already known to be the same software
    #[serde(default)]
    pub remaining: Vec<SoftwareEntry>,
}

impl ConflictGroup {
    /// Create a new conflict group
    pub fn new(disconnected: Vec<SoftwareEntry>, remaining: Vec<SoftwareEntry>) -> Self {
        Self {
            disconnected,
            remaining,
        }
    }

    /// Iterate over every entry of both partitions, disconnected first
    pub fn entries(&self) -> impl Iterator<Item = &SoftwareEntry> {
        self.disconnected.iter().chain(self.remaining.iter())
    }
}

/// One cluster of the grouped-entries file
///
/// Instances are kept as raw registry records so clusters that are not
/// under dispute are written back exactly as they were read. A resolved
/// cluster holds one JSON array per corrected group instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cluster {
    /// Registry records grouped under this cluster key
    #[serde(default)]
    pub instances: Vec<Value>,
}

impl Cluster {
    /// Identifier of a raw registry record (`_id`, else `id`)
    pub fn instance_id(instance: &Value) -> Option<&str> {
        instance
            .get("_id")
            .or_else(|| instance.get("id"))
            .and_then(Value::as_str)
    }
}

/// Grouped-entries input: cluster key to cluster
pub type GroupedEntries = BTreeMap<String, Cluster>;

/// Conflicts to resolve: conflict key to conflict group
pub type ConflictSet = BTreeMap<String, ConflictGroup>;
