//! Oracle provider configuration

use crate::error::OracleError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which oracle provider is queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// OpenRouter chat completions (requests-per-minute quota applies)
    #[serde(rename = "openrouter")]
    OpenRouter,
    /// Hugging Face router chat completions, via a sub-provider
    #[serde(rename = "huggingface")]
    HuggingFace,
    /// Hugging Face text-generation inference (single prompt string)
    HuggingfaceInference,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::HuggingFace | ProviderKind::HuggingfaceInference => "HUGGINGFACE_API_KEY",
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::OpenRouter
    }
}

/// Oracle endpoints, limits and sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Provider selector
    pub provider: ProviderKind,

    /// Model identifier sent with every request
    pub model: String,

    /// Hugging Face router sub-provider (e.g. "novita")
    pub sub_provider: Option<String>,

    /// Quota for throttled providers
    pub requests_per_minute: u32,

    /// Retry policy around each network call
    pub retry: RetryPolicy,

    /// Sampling temperature
    pub temperature: f64,

    /// OpenRouter chat completions endpoint
    pub openrouter_url: String,

    /// Hugging Face router base
    pub huggingface_router_base: String,

    /// Hugging Face text-generation inference base
    pub huggingface_inference_base: String,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// API key (from the provider's environment variable)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenRouter,
            model: String::new(),
            sub_provider: None,
            requests_per_minute: 20,
            retry: RetryPolicy::default(),
            temperature: 0.2,
            openrouter_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            huggingface_router_base: "https://router.huggingface.co".to_string(),
            huggingface_inference_base: "https://api-inference.huggingface.co/models".to_string(),
            request_timeout_secs: 300,
            api_key: None,
        }
    }
}

impl OracleConfig {
    /// Read the provider's API key from the environment
    pub fn with_env_credentials(mut self) -> Self {
        self.api_key = std::env::var(self.provider.api_key_var())
            .ok()
            .filter(|k| !k.is_empty());
        self
    }

    /// The API key, or an error naming the variable to set
    pub fn require_api_key(&self) -> Result<&str, OracleError> {
        self.api_key
            .as_deref()
            .ok_or(OracleError::MissingCredentials(self.provider.api_key_var()))
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.retry.validate()?;
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature must be in [0, 2], got {}", self.temperature));
        }
        if self.provider == ProviderKind::HuggingFace && self.sub_provider.is_none() {
            return Err("sub_provider is required for the huggingface provider".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
