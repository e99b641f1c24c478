use std::fmt;

use serde::{Deserialize, Serialize};

/// The system prompt that opens every fresh transcript.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Role type for a transcript message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System role.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl MessageRole {
    /// The wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// The role name with its first letter capitalized, as shown by `history`.
    pub fn capitalized(&self) -> &'static str {
        match self {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a transcript.
///
/// Messages are append-only: once pushed onto a transcript they are never
/// rewritten or removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The role of the message.
    pub role: MessageRole,

    /// The text of the message.
    pub content: String,
}

impl Message {
    /// Create a new `Message` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system `Message`.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a new user `Message`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant `Message`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The system message every new transcript starts with.
    pub fn default_system() -> Self {
        Self::system(DEFAULT_SYSTEM_PROMPT)
    }
}

/// A transcript containing only the default system message.
pub fn default_transcript() -> Vec<Message> {
    vec![Message::default_system()]
}

/// Formats a transcript the way the `history` command prints it.
pub fn history_lines(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.capitalized(), m.content))
        .collect()
}
