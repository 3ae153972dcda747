//! Gemini-backed session with retained turn history.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::gemini::GeminiClient;
use crate::token_tracker::TokenTracker;
use crate::{lock, AiClient, AiError, AiResponse, ChunkCallback, Message, Role};

use super::types::{BusyGuard, ChatSession};

/// A conversation with a fixed system instruction and the history of
/// completed turns, replayed on every request.
pub struct GeminiSession<C = GeminiClient> {
    client: C,
    model: String,
    system_instruction: String,
    /// Completed turns only: alternating user / model messages.
    history: Mutex<Vec<Message>>,
    tracker: Mutex<TokenTracker>,
    /// Set while a reply is streaming.
    busy: AtomicBool,
}

impl<C> std::fmt::Debug for GeminiSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSession")
            .field("model", &self.model)
            .field("system_instruction", &self.system_instruction)
            .field("turns", &(lock(&self.history).len() / 2))
            .finish_non_exhaustive()
    }
}

impl<C: AiClient> GeminiSession<C> {
    pub fn new(client: C, model: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system_instruction: system_instruction.into(),
            history: Mutex::new(Vec::new()),
            tracker: Mutex::new(TokenTracker::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Messages for the next request: system instruction, history, new turn.
    pub(crate) fn build_messages(&self, text: &str) -> Vec<Message> {
        let history = lock(&self.history);
        let mut msgs = Vec::with_capacity(history.len() + 2);
        msgs.push(Message::new(Role::System, self.system_instruction.clone()));
        msgs.extend(history.iter().cloned());
        msgs.push(Message::new(Role::User, text));
        msgs
    }

    /// Completed turns recorded so far.
    pub fn history(&self) -> Vec<Message> {
        lock(&self.history).clone()
    }
}

#[async_trait]
impl<C: AiClient> ChatSession for GeminiSession<C> {
    fn model(&self) -> &str {
        &self.model
    }

    fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    async fn send_message_streaming(
        &self,
        text: &str,
        on_chunk: ChunkCallback,
    ) -> Result<AiResponse, AiError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let messages = self.build_messages(text);
        let response = self
            .client
            .send_message_streaming(&messages, on_chunk)
            .await?;

        lock(&self.tracker).record(&response.usage);
        {
            let mut history = lock(&self.history);
            history.push(Message::new(Role::User, text));
            history.push(Message::new(Role::Model, response.content.clone()));
            debug!(turns = history.len() / 2, "session history updated");
        }

        Ok(response)
    }

    fn usage(&self) -> TokenTracker {
        lock(&self.tracker).clone()
    }
}
