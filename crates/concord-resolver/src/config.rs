//! Configuration for resolution runs

use concord_assembler::{PromptMode, PromptStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a run reads and writes its files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// Ledger of resolved conflicts
    pub ledger: PathBuf,

    /// Prepared prompts
    pub messages: PathBuf,

    /// Directory of raw answers and usage metadata
    pub raw_results_dir: PathBuf,

    /// Review items for unclear verdicts
    pub review_queue: PathBuf,

    /// Failed conflicts
    pub error_log: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from("data/results.jsonl"),
            messages: PathBuf::from("data/messages.jsonl"),
            raw_results_dir: PathBuf::from("data/raw_results"),
            review_queue: PathBuf::from("data/issues.jsonl"),
            error_log: PathBuf::from("data/error_conflicts.jsonl"),
        }
    }
}

/// Settings shared by preparation, inference and resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Model identifier passed to every oracle call
    pub model: String,

    /// Chat messages or a flattened prompt
    pub prompt_mode: PromptMode,

    /// Production or benchmarking instructions
    pub prompt_style: PromptStyle,

    /// Record unparsable answers as solved (with an empty result)
    pub persist_unparsed: bool,

    /// Files used by the run
    pub paths: OutputPaths,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt_mode: PromptMode::Chat,
            prompt_style: PromptStyle::Production,
            persist_unparsed: false,
            paths: OutputPaths::default(),
        }
    }
}

impl ResolverConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must be set".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
