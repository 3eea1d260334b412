//! The prepared-messages file read by batch inference

use crate::error::LedgerError;
use crate::jsonl::KeyedLog;
use concord_domain::Prompt;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::warn;

/// JSONL file of `{conflict_key: prompt}` records
#[derive(Debug, Clone)]
pub struct MessagesFile {
    log: KeyedLog<Prompt>,
}

impl MessagesFile {
    /// Messages file at `path` (created on first append)
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            log: KeyedLog::new(path),
        }
    }

    /// File backing the messages
    pub fn path(&self) -> &Path {
        self.log.path()
    }

    /// Keys already prepared
    pub fn keys(&self) -> Result<BTreeSet<String>, LedgerError> {
        self.log.keys()
    }

    /// Prompts in file order; a repeated key keeps its first prompt
    pub fn load(&self) -> Result<Vec<(String, Prompt)>, LedgerError> {
        let mut seen = HashSet::new();
        let mut prompts = Vec::new();
        for (key, prompt) in self.log.entries()? {
            if seen.insert(key.clone()) {
                prompts.push((key, prompt));
            } else {
                warn!("Duplicate messages for {} in {}", key, self.path().display());
            }
        }
        Ok(prompts)
    }

    /// Append the prompt prepared for `key`
    pub fn append(&self, key: &str, prompt: &Prompt) -> Result<(), LedgerError> {
        self.log.append(key, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_domain::Message;
    use tempfile::TempDir;

    #[test]
    fn test_both_prompt_forms_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = MessagesFile::open(dir.path().join("messages.jsonl"));

        let chat = Prompt::Chat(vec![Message::user("instruction"), Message::user("closing")]);
        file.append("a", &chat).unwrap();
        file.append("b", &Prompt::Flattened("### User\nhi\n\n### Assistant".into())).unwrap();
        file.append("a", &Prompt::Flattened("later".into())).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], ("a".to_string(), chat));
        assert!(matches!(loaded[1].1, Prompt::Flattened(_)));
        assert_eq!(file.keys().unwrap().len(), 2);
    }
}
