//! Concord Oracle Client
//!
//! Implementations of the [`Oracle`] trait from `concord-domain`.
//!
//! # Providers
//!
//! - [`ChatCompletionsProvider`]: OpenRouter and the Hugging Face router
//! - [`TextGenerationProvider`]: Hugging Face text-generation inference
//! - [`MockOracle`]: deterministic answers for tests
//!
//! Every network call runs under a [`RetryPolicy`]. When retries are
//! exhausted, or a success body has no answer, the reply degrades to
//! [`OracleReply::empty`] so one conflict cannot abort a batch.

#![warn(missing_docs)]

pub mod chat;
pub mod config;
pub mod error;
pub mod mock;
pub mod rate_limit;
pub mod retry;
pub mod text_generation;

use async_trait::async_trait;
use concord_domain::{Oracle, OracleReply, Prompt};
use tracing::info;

pub use chat::ChatCompletionsProvider;
pub use config::{OracleConfig, ProviderKind};
pub use error::OracleError;
pub use mock::MockOracle;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use text_generation::TextGenerationProvider;

/// The oracle selected by configuration
pub enum OracleClient {
    /// Chat completions endpoint
    Chat(ChatCompletionsProvider),
    /// Single-prompt text generation endpoint
    TextGeneration(TextGenerationProvider),
}

impl OracleClient {
    /// Build the configured provider
    ///
    /// Fails when the configuration is invalid or the API key is missing.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        config.validate().map_err(OracleError::Config)?;
        let api_key = config.require_api_key()?;
        let timeout = config.request_timeout();

        let client = match config.provider {
            ProviderKind::OpenRouter => OracleClient::Chat(
                ChatCompletionsProvider::openrouter(
                    &config.openrouter_url,
                    api_key,
                    timeout,
                    config.temperature,
                    config.requests_per_minute,
                )?
                .with_retry(config.retry),
            ),
            ProviderKind::HuggingFace => {
                let sub_provider = config.sub_provider.as_deref().unwrap_or_default();
                OracleClient::Chat(
                    ChatCompletionsProvider::huggingface(
                        &config.huggingface_router_base,
                        sub_provider,
                        api_key,
                        timeout,
                    )?
                    .with_retry(config.retry),
                )
            }
            ProviderKind::HuggingfaceInference => OracleClient::TextGeneration(
                TextGenerationProvider::new(
                    &config.huggingface_inference_base,
                    api_key,
                    timeout,
                    config.temperature,
                )?
                .with_retry(config.retry),
            ),
        };
        info!("Oracle provider: {:?}", config.provider);
        Ok(client)
    }
}

#[async_trait]
impl Oracle for OracleClient {
    type Error = OracleError;

    async fn query(&self, prompt: &Prompt, model: &str) -> Result<OracleReply, OracleError> {
        match self {
            OracleClient::Chat(provider) => provider.query(prompt, model).await,
            OracleClient::TextGeneration(provider) => provider.query(prompt, model).await,
        }
    }

    fn requests_per_minute(&self) -> Option<u32> {
        match self {
            OracleClient::Chat(provider) => provider.requests_per_minute(),
            OracleClient::TextGeneration(provider) => provider.requests_per_minute(),
        }
    }
}
