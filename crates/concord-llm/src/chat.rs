//! Chat-completions providers (OpenRouter, Hugging Face router)

use crate::error::OracleError;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use concord_domain::{Message, Oracle, OracleReply, Prompt, UsageMetadata};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Request body for an OpenAI-style chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Oracle backed by a chat completions endpoint
///
/// A flattened prompt is sent as a single user message.
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: Option<f64>,
    sub_provider: Option<String>,
    requests_per_minute: Option<u32>,
    retry: RetryPolicy,
}

impl ChatCompletionsProvider {
    /// Create a provider for `endpoint`
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            temperature: None,
            sub_provider: None,
            requests_per_minute: None,
            retry: RetryPolicy::default(),
        })
    }

    /// OpenRouter: sends a temperature and is throttled to `rpm`
    pub fn openrouter(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        temperature: f64,
        rpm: u32,
    ) -> Result<Self, OracleError> {
        let mut provider = Self::new(endpoint, api_key, timeout)?;
        provider.temperature = Some(temperature);
        provider.requests_per_minute = Some(rpm);
        Ok(provider)
    }

    /// Hugging Face router for `sub_provider`
    pub fn huggingface(
        router_base: &str,
        sub_provider: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let sub_provider = sub_provider.into();
        if sub_provider.trim().is_empty() {
            return Err(OracleError::InvalidEndpoint("empty sub-provider".to_string()));
        }
        let endpoint = format!(
            "{}/{}/v1/chat/completions",
            router_base.trim_end_matches('/'),
            sub_provider
        );
        let mut provider = Self::new(endpoint, api_key, timeout)?;
        provider.sub_provider = Some(sub_provider);
        Ok(provider)
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<Value, OracleError> {
        let response = self
            .client
            .post(&self.endpoint)
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

    /// Answer and usage from a chat completions body
    ///
    /// `None` when the body has no non-empty answer.
    pub fn parse_body(&self, body: &Value) -> Option<OracleReply> {
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())?;

        let mut usage: UsageMetadata = body
            .get("usage")
            .cloned()
            .and_then(|u| serde_json::from_value(u).ok())
            .unwrap_or_default();
        usage.provider = match &self.sub_provider {
            Some(sub) => Some(sub.clone()),
            None => body.get("provider").and_then(Value::as_str).map(str::to_string),
        };
        Some(OracleReply::new(content, usage))
    }
}

#[async_trait]
impl Oracle for ChatCompletionsProvider {
    type Error = OracleError;

    async fn query(&self, prompt: &Prompt, model: &str) -> Result<OracleReply, OracleError> {
        if model.trim().is_empty() {
            return Err(OracleError::Config("model must not be empty".to_string()));
        }
        let flattened;
        let messages: &[Message] = match prompt {
            Prompt::Chat(messages) => messages,
            Prompt::Flattened(text) => {
                flattened = [Message::user(text.as_str())];
                &flattened
            }
        };
        let body = ChatRequest {
            model,
            messages,
            temperature: self.temperature,
        };

        info!("Sending {} messages to {} (model {})", messages.len(), self.endpoint, model);
        let result = self
            .retry
            .run(|| self.send(&body), OracleError::is_transient)
            .await;

        match result {
            Ok(value) => Ok(self.parse_body(&value).unwrap_or_else(|| {
                warn!("Oracle response had no answer: {}", value);
                OracleReply::empty()
            })),
            Err(e) => {
                warn!("Oracle request to {} failed: {}", self.endpoint, e);
                Ok(OracleReply::empty())
            }
        }
    }

    fn requests_per_minute(&self) -> Option<u32> {
        self.requests_per_minute
    }
}
