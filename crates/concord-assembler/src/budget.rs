//! Token budgeting and greedy chunking

use crate::error::AssemblyError;
use concord_domain::{Message, TokenCounter};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};
use tracing::{debug, warn};

/// Tokenizers already built, keyed by model name
static TOKENIZERS: Lazy<Mutex<HashMap<String, Arc<CoreBPE>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Counts tokens with a model's BPE tokenizer
///
/// Construction is memoized per model for the lifetime of the process.
/// Unknown models fall back to `cl100k_base`.
#[derive(Clone)]
pub struct TiktokenCounter {
    model: String,
    bpe: Arc<CoreBPE>,
}

impl TiktokenCounter {
    /// Tokenizer for `model`
    pub fn for_model(model: &str) -> Result<Self, AssemblyError> {
        let mut cache = TOKENIZERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(bpe) = cache.get(model) {
            return Ok(Self {
                model: model.to_string(),
                bpe: Arc::clone(bpe),
            });
        }

        let bpe = match get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                warn!("No tokenizer for model '{}' ({}), using cl100k_base", model, e);
                cl100k_base().map_err(|e| AssemblyError::Tokenizer(e.to_string()))?
            }
        };
        debug!("Loaded tokenizer for model '{}'", model);

        let bpe = Arc::new(bpe);
        cache.insert(model.to_string(), Arc::clone(&bpe));
        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }

    /// Model this counter was built for
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Split `text` into word chunks of at most `max_tokens` tokens each
///
/// Words are accumulated greedily in order; each word is counted together
/// with its trailing space. A word that alone exceeds the limit gets a chunk
/// of its own. Joining the chunks with single spaces gives back the words of
/// `text` separated by single spaces.
pub fn chunk_text<C>(text: &str, max_tokens: usize, counter: &C) -> Vec<String>
where
    C: TokenCounter + ?Sized,
{
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0;

    for word in text.split_whitespace() {
        let tokens = counter.count(&format!("{} ", word));
        if current_tokens + tokens > max_tokens && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_tokens = 0;
        }
        current.push(word);
        current_tokens += tokens;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Split `entries` into groups of at most `max_tokens` tokens each
///
/// Each entry is counted by its compact JSON serialization. Order is kept
/// and no entry is ever dropped.
pub fn chunk_entries<T, C>(
    entries: &[T],
    max_tokens: usize,
    counter: &C,
) -> Result<Vec<Vec<T>>, AssemblyError>
where
    T: Serialize + Clone,
    C: TokenCounter + ?Sized,
{
    let mut chunks = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut current_tokens = 0;

    for entry in entries {
        let tokens = counter.count(&serde_json::to_string(entry)?);
        if current_tokens + tokens > max_tokens && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current.push(entry.clone());
        current_tokens += tokens;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

/// Summed token count of every message's content
pub fn count_message_tokens<C>(messages: &[Message], counter: &C) -> usize
where
    C: TokenCounter + ?Sized,
{
    messages.iter().map(|m| counter.count(&m.content)).sum()
}
