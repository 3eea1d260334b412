//! Single-prompt text-generation provider (Hugging Face inference API)

use crate::error::OracleError;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use concord_domain::{Oracle, OracleReply, Prompt, UsageMetadata};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Serialize)]
struct GenerationParameters {
    temperature: f64,
    top_p: f64,
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

/// Oracle that takes one prompt string and returns generated text
///
/// Chat prompts are sent as their content joined with blank lines; callers
/// wanting role headers should build a flattened prompt instead.
pub struct TextGenerationProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    temperature: f64,
    max_new_tokens: u32,
    retry: RetryPolicy,
}

impl TextGenerationProvider {
    /// Create a provider; the model is appended to `base_url` per request
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        temperature: f64,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            temperature,
            max_new_tokens: 512,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Limit the generated length
    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), model)
    }

    async fn send(&self, url: &str, body: &GenerationRequest<'_>) -> Result<Value, OracleError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Generated text from a text-generation response body
pub fn generated_text(body: &Value) -> Option<&str> {
    body.pointer("/0/generated_text")
        .or_else(|| body.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

#[async_trait]
impl Oracle for TextGenerationProvider {
    type Error = OracleError;

    async fn query(&self, prompt: &Prompt, model: &str) -> Result<OracleReply, OracleError> {
        if model.trim().is_empty() {
            return Err(OracleError::Config("model must not be empty".to_string()));
        }
        let inputs = match prompt {
            Prompt::Flattened(text) => text.clone(),
            Prompt::Chat(messages) => messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        };
        let body = GenerationRequest {
            inputs: &inputs,
            parameters: GenerationParameters {
                temperature: self.temperature,
                top_p: 0.95,
                max_new_tokens: self.max_new_tokens,
                return_full_text: false,
            },
        };
        let url = self.endpoint(model);

        info!("Sending prompt of {} chars to {}", inputs.len(), url);
        let result = self
            .retry
            .run(|| self.send(&url, &body), OracleError::is_transient)
            .await;

        match result {
            Ok(value) => Ok(match generated_text(&value) {
                Some(text) => OracleReply::new(text, UsageMetadata::default()),
                None => {
                    warn!("Text generation response had no text: {}", value);
                    OracleReply::empty()
                }
            }),
            Err(e) => {
                warn!("Text generation request to {} failed: {}", url, e);
                Ok(OracleReply::empty())
            }
        }
    }
}
