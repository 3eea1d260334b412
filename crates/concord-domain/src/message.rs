//! Oracle request messages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User turn
    User,
    /// Assistant turn
    Assistant,
}

impl Role {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A fully assembled oracle request
///
/// Serialized untagged so the messages file holds either a JSON array of
/// messages or a single prompt string per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    /// Ordered chat messages
    Chat(Vec<Message>),
    /// A single flattened prompt string
    Flattened(String),
}

impl Prompt {
    /// Number of messages (a flattened prompt counts as one)
    pub fn len(&self) -> usize {
        match self {
            Prompt::Chat(messages) => messages.len(),
            Prompt::Flattened(_) => 1,
        }
    }

    /// True for a chat prompt with no messages
    pub fn is_empty(&self) -> bool {
        match self {
            Prompt::Chat(messages) => messages.is_empty(),
            Prompt::Flattened(text) => text.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_untagged_forms() {
        let chat: Prompt = serde_json::from_str(r#"[{"role": "user", "content": "hi"}]"#).unwrap();
        assert_eq!(chat, Prompt::Chat(vec![Message::user("hi")]));

        let flat: Prompt = serde_json::from_str("\"### User\\nhi\"").unwrap();
        assert_eq!(flat, Prompt::Flattened("### User\nhi".to_string()));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::system("x")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"x"}"#);
    }
}
