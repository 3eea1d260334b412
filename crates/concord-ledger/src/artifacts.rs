//! Raw answers and usage metadata written per conflict

use crate::error::LedgerError;
use crate::jsonl::append_line;
use concord_domain::UsageMetadata;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Conflict key made safe for a file name (spaces and `/` become `_`)
pub fn sanitize_key(key: &str) -> String {
    key.replace([' ', '/'], "_")
}

/// Directory of `raw_results_{key}.json` / `meta_{key}.json` pairs
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the raw answer file for `key`
    pub fn raw_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("raw_results_{}.json", sanitize_key(key)))
    }

    /// Path of the metadata file for `key`
    pub fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("meta_{}.json", sanitize_key(key)))
    }

    /// Write the answer as a JSON string, replacing any earlier one
    pub fn write_raw(&self, key: &str, answer: &str) -> Result<PathBuf, LedgerError> {
        fs::create_dir_all(&self.dir).map_err(|e| LedgerError::io(&self.dir, e))?;
        let path = self.raw_path(key);
        let mut content = serde_json::to_string(answer)?;
        content.push('\n');
        fs::write(&path, content).map_err(|e| LedgerError::io(&path, e))?;
        info!("Raw result saved to {}", path.display());
        Ok(path)
    }

    /// Append usage plus `total_time` (seconds) and `key` to the metadata file
    pub fn append_meta(
        &self,
        key: &str,
        usage: &UsageMetadata,
        elapsed: Duration,
    ) -> Result<PathBuf, LedgerError> {
        let mut meta = match serde_json::to_value(usage)? {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        meta.insert("total_time".to_string(), json!(elapsed.as_secs_f64()));
        meta.insert("key".to_string(), json!(key));

        let path = self.meta_path(key);
        append_line(&path, &meta)?;
        info!("Metadata saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("bio tools/cli"), "bio_tools_cli");
        assert_eq!(sanitize_key("plain"), "plain");
    }

    #[test]
    fn test_raw_answer_is_json_string() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("raw"));

        let path = store.write_raw("a/b", "line one\n\"quoted\"").unwrap();
        assert!(path.ends_with("raw_results_a_b.json"));
        let content = fs::read_to_string(path).unwrap();
        let decoded: String = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(decoded, "line one\n\"quoted\"");
    }

    #[test]
    fn test_meta_is_appended() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let usage = UsageMetadata {
            total_tokens: Some(10),
            provider: Some("novita".to_string()),
            ..Default::default()
        };

        store.append_meta("k 1", &usage, Duration::from_millis(1500)).unwrap();
        store.append_meta("k 1", &UsageMetadata::default(), Duration::from_secs(2)).unwrap();

        let content = fs::read_to_string(store.meta_path("k 1")).unwrap();
        let lines: Vec<Value> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["total_tokens"], 10);
        assert_eq!(lines[0]["total_time"], 1.5);
        assert_eq!(lines[0]["key"], "k 1");
        assert_eq!(lines[1]["total_time"], 2.0);
    }
}
