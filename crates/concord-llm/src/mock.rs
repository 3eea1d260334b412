//! Deterministic oracle for tests and dry runs

use crate::error::OracleError;
use async_trait::async_trait;
use concord_domain::{Oracle, OracleReply, Prompt, UsageMetadata};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum Scripted {
    Answer(String),
    Error(String),
}

/// Mock oracle returning pre-configured answers without network calls
///
/// Answers are chosen by the first registered marker that appears in the
/// prompt text, falling back to a default answer. Clones share the call
/// count and the recorded prompts.
///
/// ```
/// use concord_domain::{Oracle, Prompt};
/// use concord_llm::MockOracle;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let mut oracle = MockOracle::new("{\"verdict\": \"Same\"}");
/// oracle.add_response("toolB", "{\"verdict\": \"Different\"}");
///
/// let reply = rt.block_on(oracle.query(&Prompt::Flattened("toolA vs toolB".into()), "m")).unwrap();
/// assert_eq!(reply.answer, "{\"verdict\": \"Different\"}");
/// assert_eq!(oracle.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockOracle {
    default_answer: String,
    responses: Arc<Mutex<Vec<(String, Scripted)>>>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
    call_count: Arc<AtomicUsize>,
    requests_per_minute: Option<u32>,
}

impl MockOracle {
    /// Mock answering `answer` to every prompt
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            default_answer: answer.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            requests_per_minute: None,
        }
    }

    /// Answer `answer` to prompts containing `marker`
    pub fn add_response(&mut self, marker: impl Into<String>, answer: impl Into<String>) {
        lock(&self.responses).push((marker.into(), Scripted::Answer(answer.into())));
    }

    /// Fail prompts containing `marker`
    pub fn add_error(&mut self, marker: impl Into<String>, message: impl Into<String>) {
        lock(&self.responses).push((marker.into(), Scripted::Error(message.into())));
    }

    /// Report a requests-per-minute quota like a throttled provider
    pub fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = Some(rpm);
        self
    }

    /// Number of times `query` was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count and forget recorded prompts
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        lock(&self.prompts).clear();
    }

    /// Every prompt received so far, in order
    pub fn prompts(&self) -> Vec<Prompt> {
        lock(&self.prompts).clone()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new("{\"verdict\": \"Unclear\", \"explanation\": \"Mock oracle\"}")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prompt_text(prompt: &Prompt) -> String {
    match prompt {
        Prompt::Flattened(text) => text.clone(),
        Prompt::Chat(messages) => messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[async_trait]
impl Oracle for MockOracle {
    type Error = OracleError;

    async fn query(&self, prompt: &Prompt, model: &str) -> Result<OracleReply, OracleError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.prompts).push(prompt.clone());

        let text = prompt_text(prompt);
        let scripted = lock(&self.responses)
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
            .map(|(_, scripted)| scripted.clone());

        let answer = match scripted {
            Some(Scripted::Error(message)) => return Err(OracleError::Mock(message)),
            Some(Scripted::Answer(answer)) => answer,
            None => self.default_answer.clone(),
        };
        let usage = UsageMetadata {
            prompt_tokens: Some(text.split_whitespace().count() as u64),
            provider: Some(format!("mock/{}", model)),
            ..Default::default()
        };
        Ok(OracleReply::new(answer, usage))
    }

    fn requests_per_minute(&self) -> Option<u32> {
        self.requests_per_minute
    }
}
