//! Configuration for token budgeting and prompt rendering

use serde::{Deserialize, Serialize};

/// How the message sequence is handed to the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Ordered chat messages
    Chat,
    /// One text block with role headers
    Flattened,
}

impl Default for PromptMode {
    fn default() -> Self {
        PromptMode::Chat
    }
}

/// Which instruction family is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Partition-dependent templates; the oracle returns corrected groups
    Production,
    /// Pairwise comparison; the oracle returns the decisive features
    Benchmarking,
}

impl Default for PromptStyle {
    fn default() -> Self {
        PromptStyle::Production
    }
}

/// Token limits and tokenizer selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum tokens in one chunk of text or entries
    pub max_tokens_per_chunk: usize,

    /// Maximum tokens in one whole oracle request
    pub max_total_tokens: usize,

    /// Model whose tokenizer counts tokens
    pub tokenizer_model: String,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: 8_000,
            max_total_tokens: 130_000,
            tokenizer_model: "gpt-4".to_string(),
        }
    }
}

impl BudgetConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens_per_chunk == 0 {
            return Err("max_tokens_per_chunk must be greater than 0".to_string());
        }
        if self.max_total_tokens == 0 {
            return Err("max_total_tokens must be greater than 0".to_string());
        }
        if self.max_tokens_per_chunk > self.max_total_tokens {
            return Err("max_tokens_per_chunk cannot exceed max_total_tokens".to_string());
        }
        if self.tokenizer_model.trim().is_empty() {
            return Err("tokenizer_model must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BudgetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tokens_per_chunk, 8_000);
        assert_eq!(config.max_total_tokens, 130_000);
    }

    #[test]
    fn test_chunk_larger_than_ceiling_rejected() {
        let config = BudgetConfig {
            max_tokens_per_chunk: 200_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = BudgetConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = BudgetConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.tokenizer_model, config.tokenizer_model);
    }

    #[test]
    fn test_modes_parse_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: PromptMode,
            style: PromptStyle,
        }
        let w: Wrapper = toml::from_str("mode = \"flattened\"\nstyle = \"benchmarking\"").unwrap();
        assert_eq!(w.mode, PromptMode::Flattened);
        assert_eq!(w.style, PromptStyle::Benchmarking);
    }
}
