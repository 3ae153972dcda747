//! AI engine for FarmCom chat.
//!
//! Provides:
//! - A Gemini client with SSE streaming and validated chunk extraction
//! - A session factory and the `ChatSession` handle it produces
//! - Token usage tracking
//! - The transcript controller that drives one streamed turn at a time

pub mod gemini;
pub mod session;
pub mod streaming;
pub mod token_tracker;
pub mod transcript;

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

pub use gemini::{GeminiClient, GeminiConfig};
pub use session::{create_session, ChatSession, GeminiSession, SessionError, SessionFactory};
pub use token_tracker::TokenTracker;
pub use transcript::{
    ChatMessage, ChatRole, ControllerSettings, MessageStatus, TranscriptController,
    TranscriptEvent,
};

/// Receives each non-empty text chunk of a streamed reply, in arrival order.
pub type ChunkCallback = Box<dyn Fn(String) + Send + Sync>;

#[async_trait]
pub trait AiClient: Send + Sync {
    /// Stream a reply for `messages`, invoking `on_chunk` per text chunk.
    /// Returns the full reply once the stream ends.
    async fn send_message_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkCallback,
    ) -> Result<AiResponse, AiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

#[derive(Debug, Clone, Default)]
pub struct AiResponse {
    pub content: String,
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Failures of a single streamed exchange.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Blocked: {0}")]
    Blocked(String),
    #[error("Timeout")]
    Timeout,
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else {
            AiError::NetworkError(e.to_string())
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_tokens_saturates() {
        let usage = TokenUsage {
            input_tokens: u64::MAX,
            output_tokens: 10,
        };
        assert_eq!(usage.total_tokens(), u64::MAX);
    }

    #[test]
    fn ai_error_display() {
        assert_eq!(AiError::RateLimited.to_string(), "Rate limited");
        assert_eq!(
            AiError::Blocked("SAFETY".into()).to_string(),
            "Blocked: SAFETY"
        );
        assert_eq!(
            AiError::NetworkError("connection reset".into()).to_string(),
            "Network error: connection reset"
        );
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Model).unwrap();
        assert_eq!(json, "\"model\"");
    }
}
