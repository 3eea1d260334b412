//! The resumable ledger of resolved conflicts

use crate::error::LedgerError;
use crate::jsonl::KeyedLog;
use concord_domain::ResolutionResult;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Append-only record of every conflict the oracle has answered
///
/// Each line is `{conflict_key: result}`. A key present in the file is
/// solved and must not be sent to the oracle again; reprocessing means
/// deleting or rotating the file.
#[derive(Debug, Clone)]
pub struct Ledger {
    log: KeyedLog<Value>,
}

impl Ledger {
    /// Ledger stored at `path` (created on first append)
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            log: KeyedLog::new(path),
        }
    }

    /// File backing the ledger
    pub fn path(&self) -> &Path {
        self.log.path()
    }

    /// Keys of every recorded conflict
    pub fn load_solved_keys(&self) -> Result<BTreeSet<String>, LedgerError> {
        let keys = self.log.keys()?;
        info!("{} solved conflicts in {}", keys.len(), self.path().display());
        Ok(keys)
    }

    /// Stored results by key; the last record of a key wins
    ///
    /// Records that are not a resolution result (e.g. a persisted
    /// unparsable answer) still count as solved but are left out here.
    pub fn load_results(&self) -> Result<BTreeMap<String, ResolutionResult>, LedgerError> {
        let mut results = BTreeMap::new();
        for (key, value) in self.log.entries()? {
            match serde_json::from_value::<ResolutionResult>(value) {
                Ok(result) => {
                    results.insert(key, result);
                }
                Err(e) => debug!("Ledger record {} has no usable result: {}", key, e),
            }
        }
        Ok(results)
    }

    /// Record the result for `key`
    pub fn append(&self, key: &str, result: &ResolutionResult) -> Result<(), LedgerError> {
        self.log.append(key, &serde_json::to_value(result)?)
    }

    /// Record `key` as solved without a usable result
    pub fn append_unparsed(&self, key: &str) -> Result<(), LedgerError> {
        warn!("Recording conflict {} with an empty result", key);
        self.log.append(key, &json!({}))
    }
}
