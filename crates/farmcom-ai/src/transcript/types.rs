//! Transcript data types and controller settings.

use farmcom_common::defaults::{DEFAULT_ERROR_MESSAGE, DEFAULT_GREETING};

/// Role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

/// Lifecycle of a message. Only the newest MODEL message is ever
/// `Pending` or `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Created, no text yet.
    Pending,
    /// Receiving chunks.
    Streaming,
    Complete,
    /// The stream failed; content is the fallback text.
    Errored,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub status: MessageStatus,
}

impl ChatMessage {
    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: text.into(),
            status: MessageStatus::Complete,
        }
    }

    pub(crate) fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: text.into(),
            status: MessageStatus::Complete,
        }
    }

    pub(crate) fn pending_reply() -> Self {
        Self {
            role: ChatRole::Model,
            content: String::new(),
            status: MessageStatus::Pending,
        }
    }

    /// Whether this message is still receiving text.
    pub fn is_active(&self) -> bool {
        matches!(self.status, MessageStatus::Pending | MessageStatus::Streaming)
    }
}

/// Transcript mutations, delivered to subscribers in the order applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// The transcript was replaced by `initialize`.
    Reset { transcript: Vec<ChatMessage> },
    Appended { index: usize, message: ChatMessage },
    /// The streaming MODEL message now holds `content` (the full text so far).
    Updated { index: usize, content: String },
    /// The turn ended; `message` is the final MODEL message.
    Finished { index: usize, message: ChatMessage },
}

/// Fixed texts the controller writes into the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub greeting: String,
    pub error_message: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}
