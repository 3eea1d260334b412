//! Review queue for unclear verdicts and the error log for failed conflicts

use crate::error::LedgerError;
use crate::jsonl::{append_line, read_lines};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// JSONL queue of items a human needs to look at
#[derive(Debug, Clone)]
pub struct ReviewQueue {
    path: PathBuf,
}

impl ReviewQueue {
    /// Queue stored at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing the queue
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raise a review item
    pub fn push(&self, item: &Value) -> Result<(), LedgerError> {
        append_line(&self.path, item)
    }

    /// Every queued item
    pub fn load(&self) -> Result<Vec<Value>, LedgerError> {
        read_lines(&self.path)
    }
}

/// One failed conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Conflict key
    pub key: String,
    /// Error text
    pub error: String,
}

/// JSONL log of conflicts that failed and will be retried next run
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Log stored at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing the log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a failure
    pub fn record(&self, key: &str, error: &str) -> Result<(), LedgerError> {
        append_line(
            &self.path,
            &FailureRecord {
                key: key.to_string(),
                error: error.to_string(),
            },
        )
    }

    /// Every recorded failure
    pub fn load(&self) -> Result<Vec<FailureRecord>, LedgerError> {
        read_lines(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_review_queue() {
        let dir = TempDir::new().unwrap();
        let queue = ReviewQueue::open(dir.path().join("issues.jsonl"));
        queue.push(&json!({"title": "Check tool", "body": "unclear"})).unwrap();
        queue.push(&json!({"key": "k", "explanation": "x"})).unwrap();

        let items = queue.load().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Check tool");
    }

    #[test]
    fn test_error_log() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::open(dir.path().join("errors.jsonl"));
        log.record("k", "Prompt too long").unwrap();

        assert_eq!(
            log.load().unwrap(),
            vec![FailureRecord {
                key: "k".to_string(),
                error: "Prompt too long".to_string()
            }]
        );
    }
}
