//! Message building: instruction, entries, evidence, closing directive

use crate::budget::{chunk_entries, count_message_tokens};
use crate::config::{BudgetConfig, PromptMode, PromptStyle};
use crate::error::AssemblyError;
use crate::templates::{InstructionTemplate, TemplateContext, TemplateRegistry};
use concord_domain::{FullConflict, Message, Prompt, Role, SoftwareEntry, TokenCounter};
use std::sync::Arc;
use tracing::{debug, info};

/// Labels placed before each chunk of entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preambles {
    /// Before chunks of the `remaining` partition
    pub remaining: &'static str,
    /// Before chunks of the `disconnected` partition
    pub disconnected: &'static str,
}

impl Preambles {
    /// Production wording
    pub const PRODUCTION: Preambles = Preambles {
        remaining: "Tools known to be the **same software**",
        disconnected: "**Disconnected tools** to be analyzed",
    };

    /// Pairwise benchmarking wording
    pub const BENCHMARKING: Preambles = Preambles {
        remaining: "The second software metadata_entry",
        disconnected: "The first software metadata_entry",
    };
}

/// Closing directive for production requests
pub const PRODUCTION_CLOSING: &str = "All parts have been sent. Please now analyze the entries and provide the output as specified. \n\nIMPORTANT: Return ONLY a valid JSON object with the following keys: 'verdict', 'explanation', 'confidence', and 'groups'. Do NOT add explanations or extra commentary outside the object. This is a strict output constraint.";

/// Closing directive for benchmarking requests
pub const BENCHMARKING_CLOSING: &str = "All parts have been sent. Please now analyze the entries and provide the output as specified. \n\nIMPORTANT: Return ONLY a valid JSON object with the following keys: 'verdict', 'explanation', 'confidence', and 'features'. Do NOT add explanations or extra commentary outside the object. This is a strict output constraint.";

/// Production template for a partition shape
///
/// `d` entries under evaluation, `r` known-same anchors.
pub fn select_template(d: usize, r: usize) -> Result<InstructionTemplate, AssemblyError> {
    match (d, r) {
        (1, 1) => Ok(InstructionTemplate::DisconnectedEntries),
        (d, 0) if d > 1 => Ok(InstructionTemplate::DisconnectedEntries),
        (1, r) if r > 1 => Ok(InstructionTemplate::OneDisconnectedSeveralRemaining),
        (d, r) if d > 1 && r >= 1 => Ok(InstructionTemplate::SeveralDisconnectedSeveralRemaining),
        (d, r) => Err(AssemblyError::UnsupportedPartition {
            disconnected: d,
            remaining: r,
        }),
    }
}

/// Turn an unbalanced pair into one disconnected entry and one anchor
///
/// Two disconnected entries and no anchors: the second becomes the anchor.
/// No disconnected entries and two anchors: the first becomes disconnected.
pub fn rebalance_pair(conflict: &mut FullConflict) {
    if conflict.disconnected.len() > 1 && conflict.remaining.is_empty() {
        let second = conflict.disconnected.remove(1);
        conflict.disconnected.truncate(1);
        conflict.remaining = vec![second];
    } else if conflict.disconnected.is_empty() && conflict.remaining.len() == 2 {
        let first = conflict.remaining.remove(0);
        conflict.disconnected = vec![first];
    }
}

/// Render messages into one prompt string with role headers
pub fn flatten_messages(messages: &[Message]) -> String {
    let mut parts: Vec<String> = messages
        .iter()
        .map(|m| format!("{}\n{}\n", role_header(m.role), m.content.trim()))
        .collect();
    parts.push("### Assistant\n".to_string());
    parts.join("\n").trim().to_string()
}

fn role_header(role: Role) -> &'static str {
    match role {
        Role::System => "### System",
        Role::User => "### User",
        Role::Assistant => "### Assistant",
    }
}

/// Builds the ordered oracle request for a full conflict
pub struct MessageBuilder {
    templates: Arc<TemplateRegistry>,
    counter: Arc<dyn TokenCounter>,
    budget: BudgetConfig,
}

impl MessageBuilder {
    /// Create a message builder
    pub fn new(
        templates: Arc<TemplateRegistry>,
        counter: Arc<dyn TokenCounter>,
        budget: BudgetConfig,
    ) -> Self {
        Self {
            templates,
            counter,
            budget,
        }
    }

    /// Assemble the ordered messages and enforce the token ceiling
    ///
    /// Order: instruction, remaining chunks, disconnected chunks, one message
    /// per (URL, label) of evidence, closing directive.
    pub fn build_messages(
        &self,
        instruction: &str,
        conflict: &FullConflict,
        preambles: Preambles,
        closing: &str,
    ) -> Result<Vec<Message>, AssemblyError> {
        let mut messages = vec![Message::user(instruction)];

        self.push_entry_chunks(&mut messages, &conflict.remaining, preambles.remaining)?;
        self.push_entry_chunks(&mut messages, &conflict.disconnected, preambles.disconnected)?;

        for (url, contents) in &conflict.webpage_contents {
            for (label, chunks) in contents {
                messages.push(Message::user(format!(
                    "Content from {}:\n```\n{}:\n{}\n```",
                    url,
                    label,
                    chunks.join("\n\n")
                )));
            }
        }

        messages.push(Message::user(closing));

        let total = count_message_tokens(&messages, self.counter.as_ref());
        info!("Total tokens: {} across {} messages", total, messages.len());
        if total > self.budget.max_total_tokens {
            return Err(AssemblyError::BudgetExceeded {
                total,
                limit: self.budget.max_total_tokens,
            });
        }
        Ok(messages)
    }

    fn push_entry_chunks(
        &self,
        messages: &mut Vec<Message>,
        entries: &[SoftwareEntry],
        preamble: &str,
    ) -> Result<(), AssemblyError> {
        let chunks = chunk_entries(entries, self.budget.max_tokens_per_chunk, self.counter.as_ref())?;
        for (i, chunk) in chunks.iter().enumerate() {
            messages.push(Message::user(format!(
                "{} - part {}:\n```json\n{}\n```",
                preamble,
                i + 1,
                serde_json::to_string_pretty(chunk)?
            )));
        }
        Ok(())
    }

    /// Production messages; the template follows the partition sizes
    pub fn build_production(&self, conflict: &FullConflict) -> Result<Vec<Message>, AssemblyError> {
        let d = conflict.disconnected.len();
        let r = conflict.remaining.len();
        let template = select_template(d, r)?;
        debug!("Using template: {}", template.name());

        let instruction = self.templates.render(
            template,
            &TemplateContext {
                n_disconnected: d,
                n_remaining: r,
            },
        )?;
        self.build_messages(&instruction, conflict, Preambles::PRODUCTION, PRODUCTION_CLOSING)
    }

    /// Pairwise benchmarking prompt
    ///
    /// In chat mode an unbalanced pair is rebalanced first.
    pub fn build_benchmarking(
        &self,
        mut conflict: FullConflict,
        mode: PromptMode,
    ) -> Result<Prompt, AssemblyError> {
        let template = match mode {
            PromptMode::Chat => {
                rebalance_pair(&mut conflict);
                InstructionTemplate::BenchmarkingChat
            }
            PromptMode::Flattened => InstructionTemplate::BenchmarkingFlattened,
        };
        let instruction = self.templates.render(
            template,
            &TemplateContext {
                n_disconnected: conflict.disconnected.len(),
                n_remaining: conflict.remaining.len(),
            },
        )?;
        let messages =
            self.build_messages(&instruction, &conflict, Preambles::BENCHMARKING, BENCHMARKING_CLOSING)?;
        Ok(match mode {
            PromptMode::Chat => Prompt::Chat(messages),
            PromptMode::Flattened => Prompt::Flattened(flatten_messages(&messages)),
        })
    }

    /// Build a prompt in the given style and mode
    pub fn build_prompt(
        &self,
        conflict: FullConflict,
        style: PromptStyle,
        mode: PromptMode,
    ) -> Result<Prompt, AssemblyError> {
        match style {
            PromptStyle::Benchmarking => self.build_benchmarking(conflict, mode),
            PromptStyle::Production => {
                let messages = self.build_production(&conflict)?;
                Ok(match mode {
                    PromptMode::Chat => Prompt::Chat(messages),
                    PromptMode::Flattened => Prompt::Flattened(flatten_messages(&messages)),
                })
            }
        }
    }
}
