//! Newline-delimited JSON files

use crate::error::LedgerError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append one JSON record as a single line
///
/// The line is serialized first and written with one `write_all`, so a crash
/// loses at most this record. A torn last line left by an earlier crash is
/// closed off first so the new record starts on a line of its own. Parent
/// directories are created on demand.
pub fn append_line<T: Serialize + ?Sized>(path: &Path, record: &T) -> Result<(), LedgerError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::io(path, e))?;
    if ends_mid_line(&mut file).map_err(|e| LedgerError::io(path, e))? {
        warn!("{} ends with a partial line, starting a new one", path.display());
        line.insert(0, '\n');
    }
    file.write_all(line.as_bytes())
        .map_err(|e| LedgerError::io(path, e))
}

/// Whether the file is non-empty and its last byte is not a newline
fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read every well-formed record of a JSONL file
///
/// A missing file reads as empty. Blank lines are ignored; malformed lines
/// are skipped with a warning.
pub fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LedgerError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LedgerError::io(path, e)),
    };

    let mut records = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                "Could not parse line {} of {}: {}... ({})",
                number + 1,
                path.display(),
                preview(line),
                e
            ),
        }
    }
    Ok(records)
}

fn preview(line: &str) -> String {
    line.chars().take(100).collect()
}

/// A JSONL file of single-key records `{key: value}`
///
/// Append-only. Values that do not deserialize as `T` are skipped with a
/// warning when loading.
#[derive(Debug, Clone)]
pub struct KeyedLog<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> KeyedLog<T> {
    /// Log stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// File backing the log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Distinct keys of every well-formed line, whatever its value
    pub fn keys(&self) -> Result<BTreeSet<String>, LedgerError> {
        Ok(read_lines::<Map<String, Value>>(&self.path)?
            .into_iter()
            .filter_map(|record| record.into_iter().next().map(|(key, _)| key))
            .collect())
    }
}

impl<T: Serialize> KeyedLog<T> {
    /// Append `{key: value}` as one line
    pub fn append(&self, key: &str, value: &T) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::InvalidKey(key.to_string()));
        }
        let mut record = Map::new();
        record.insert(key.to_string(), serde_json::to_value(value)?);
        append_line(&self.path, &record)
    }
}

impl<T: DeserializeOwned> KeyedLog<T> {
    /// Every `(key, value)` in file order, including repeated keys
    pub fn entries(&self) -> Result<Vec<(String, T)>, LedgerError> {
        let mut entries = Vec::new();
        for record in read_lines::<Map<String, Value>>(&self.path)? {
            let Some((key, value)) = record.into_iter().next() else {
                warn!("Skipping empty record in {}", self.path.display());
                continue;
            };
            match serde_json::from_value::<T>(value) {
                Ok(value) => entries.push((key, value)),
                Err(e) => warn!("Skipping record {} in {}: {}", key, self.path.display(), e),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/log.jsonl");
        append_line(&path, &json!({"a": 1})).unwrap();
        append_line(&path, &json!({"b": 2})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"a\":1}\n{\"b\":2}\n");
    }

    #[test]
    fn test_append_after_partial_line_starts_a_new_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(&path, "{\"a\":1}\n{\"b\":").unwrap();
        append_line(&path, &json!({"c": 3})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"a\":1}\n{\"b\":\n{\"c\":3}\n");
        let log: KeyedLog<u32> = KeyedLog::new(&path);
        assert_eq!(
            log.entries().unwrap(),
            vec![("a".to_string(), 1), ("c".to_string(), 3)]
        );
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let records: Vec<Value> = read_lines(&dir.path().join("absent.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(&path, "{\"a\": 1}\nnot json\n\n{\"b\": 2\n{\"c\": 3}\n").unwrap();

        let log: KeyedLog<u32> = KeyedLog::new(&path);
        let keys = log.keys().unwrap();
        assert_eq!(keys, BTreeSet::from(["a".to_string(), "c".to_string()]));
        assert_eq!(
            log.entries().unwrap(),
            vec![("a".to_string(), 1), ("c".to_string(), 3)]
        );
    }

    #[test]
    fn test_keys_include_values_of_other_shapes() {
        let dir = TempDir::new().unwrap();
        let log: KeyedLog<u32> = KeyedLog::new(dir.path().join("log.jsonl"));
        append_line(log.path(), &json!({"odd": {"not": "a number"}})).unwrap();
        log.append("even", &2).unwrap();

        assert_eq!(log.keys().unwrap().len(), 2);
        assert_eq!(log.entries().unwrap(), vec![("even".to_string(), 2)]);
    }

    #[test]
    fn test_empty_key_rejected() {
        let dir = TempDir::new().unwrap();
        let log: KeyedLog<u32> = KeyedLog::new(dir.path().join("log.jsonl"));
        assert!(matches!(log.append("", &1), Err(LedgerError::InvalidKey(_))));
    }
}
