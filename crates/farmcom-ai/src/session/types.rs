//! Session trait, construction errors and the single-stream guard.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use farmcom_common::ConfigError;

use crate::token_tracker::TokenTracker;
use crate::{AiError, AiResponse, ChunkCallback};

/// A conversation handle that streams one user turn at a time.
///
/// Implementations retain their own turn history; callers only pass the
/// new user text.
#[async_trait]
pub trait ChatSession: Send + Sync {
    fn model(&self) -> &str;

    fn system_instruction(&self) -> &str;

    /// Stream the reply to `text`, calling `on_chunk` for every text chunk.
    async fn send_message_streaming(
        &self,
        text: &str,
        on_chunk: ChunkCallback,
    ) -> Result<AiResponse, AiError>;

    /// Snapshot of the token usage recorded so far.
    fn usage(&self) -> TokenTracker {
        TokenTracker::default()
    }
}

/// Failure to open a session. Both variants are terminal for the attempt.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("session init error: {0}")]
    Init(String),
}

/// Clears the session's `busy` flag on drop, including when the streaming
/// future is dropped mid-reply.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Fails with `AiError::ApiError` while another stream holds the flag.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, AiError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(AiError::ApiError(
                "session is busy with another request".into(),
            ));
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
