//! The transcript controller state machine: IDLE -> SENDING -> IDLE.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::session::ChatSession;
use crate::{lock, ChunkCallback};

use super::types::{ChatMessage, ControllerSettings, MessageStatus, TranscriptEvent};

const INTERRUPTED: &str = "the reply was interrupted before it finished";

/// Owns the transcript and the session, and streams one turn at a time.
///
/// State lives behind a mutex that is never held across an `.await`, so
/// the controller can be shared through an `Arc` while a reply streams.
pub struct TranscriptController {
    state: Arc<Mutex<ControllerState>>,
    settings: ControllerSettings,
}

#[derive(Default)]
struct ControllerState {
    transcript: Vec<ChatMessage>,
    session: Option<Arc<dyn ChatSession>>,
    /// Admission gate: true exactly while a turn is in flight.
    busy: bool,
    last_error: Option<String>,
    /// Bumped by `initialize` and by every accepted submission.
    generation: u64,
    active: Option<ActiveTurn>,
    /// Generation of a superseded turn still streaming on the current
    /// session. Admission stays closed until it ends.
    draining: Option<u64>,
    subscribers: Vec<mpsc::UnboundedSender<TranscriptEvent>>,
}

/// The MODEL message currently receiving chunks.
struct ActiveTurn {
    generation: u64,
    index: usize,
    accumulated: String,
}

impl ControllerState {
    fn emit(&mut self, event: TranscriptEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn append(&mut self, message: ChatMessage) -> usize {
        let index = self.transcript.len();
        self.transcript.push(message.clone());
        self.emit(TranscriptEvent::Appended { index, message });
        index
    }

    fn apply_chunk(&mut self, generation: u64, chunk: &str) {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|turn| turn.generation == generation)
        else {
            trace!(generation, "dropping chunk for a superseded turn");
            return;
        };

        active.accumulated.push_str(chunk);
        let index = active.index;
        let content = active.accumulated.clone();

        if let Some(message) = self.transcript.get_mut(index) {
            message.content.clone_from(&content);
            message.status = MessageStatus::Streaming;
        }
        trace!(generation, chars = content.len(), "chunk applied");
        self.emit(TranscriptEvent::Updated { index, content });
    }
}

impl Default for TranscriptController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}

impl TranscriptController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState::default())),
            settings,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Store `session` and reset the transcript to the greeting alone.
    ///
    /// Replaces all prior state. A turn still streaming from before is
    /// orphaned: its remaining chunks and its completion are ignored. When
    /// that turn streams on the same `session`, submissions stay rejected
    /// until it ends, so a session never carries two streams.
    pub fn initialize(&self, session: Arc<dyn ChatSession>) {
        let mut state = lock(&self.state);
        let streaming = state.active.take().map(|turn| turn.generation).or(state.draining);
        if streaming.is_some() {
            warn!("re-initializing while a reply is streaming; discarding it");
        }
        let reused = state
            .session
            .as_ref()
            .is_some_and(|current| same_session(current, &session));

        state.generation += 1;
        state.draining = streaming.filter(|_| reused);
        state.busy = state.draining.is_some();
        state.last_error = None;
        state.transcript = vec![ChatMessage::model(self.settings.greeting.clone())];
        info!(model = session.model(), "transcript initialized");
        state.session = Some(session);

        let transcript = state.transcript.clone();
        state.emit(TranscriptEvent::Reset { transcript });
    }

    /// Submit one user turn and stream the reply into the transcript.
    ///
    /// Does nothing when no session is set, when a reply is already
    /// streaming, or when `user_text` is blank. Stream failures never
    /// escape: the reply is replaced by the fallback text and the error
    /// message is kept in [`last_error`](Self::last_error).
    pub async fn submit(&self, user_text: &str) {
        let text = user_text.trim();
        if text.is_empty() {
            debug!("ignoring blank submission");
            return;
        }

        let Some((session, generation)) = self.begin_turn(text) else {
            return;
        };
        let guard = TurnGuard {
            controller: self,
            generation,
            finished: false,
        };

        let state = Arc::clone(&self.state);
        let on_chunk: ChunkCallback = Box::new(move |chunk: String| {
            lock(&state).apply_chunk(generation, &chunk);
        });

        let outcome = match session.send_message_streaming(text, on_chunk).await {
            Ok(response) => {
                debug!(
                    generation,
                    finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
                    "reply complete"
                );
                Ok(())
            }
            Err(e) => {
                warn!(generation, error = %e, "reply failed");
                Err(e.to_string())
            }
        };
        guard.finish(outcome);
    }

    /// Admission check and steps 1-3 of a turn, under one lock.
    fn begin_turn(&self, text: &str) -> Option<(Arc<dyn ChatSession>, u64)> {
        let mut state = lock(&self.state);
        if state.busy {
            debug!("submission rejected: a reply is still streaming");
            return None;
        }
        let Some(session) = state.session.clone() else {
            debug!("submission rejected: no session");
            return None;
        };

        state.busy = true;
        state.last_error = None;
        state.generation += 1;
        let generation = state.generation;

        state.append(ChatMessage::user(text));
        let index = state.append(ChatMessage::pending_reply());
        state.active = Some(ActiveTurn {
            generation,
            index,
            accumulated: String::new(),
        });

        debug!(generation, index, "turn started");
        Some((session, generation))
    }

    fn finish_turn(&self, generation: u64, outcome: Result<(), String>) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;

        let active = match state.active.take() {
            Some(turn) if turn.generation == generation => turn,
            other => {
                state.active = other;
                if state.draining == Some(generation) {
                    state.draining = None;
                    state.busy = false;
                    debug!(generation, "superseded turn ended; accepting submissions");
                } else {
                    debug!(generation, "ignoring completion of a superseded turn");
                }
                return;
            }
        };

        state.busy = false;
        let Some(message) = state.transcript.get_mut(active.index) else {
            return;
        };
        match outcome {
            Ok(()) => {
                message.content = active.accumulated;
                message.status = MessageStatus::Complete;
            }
            Err(error) => {
                message.content.clone_from(&self.settings.error_message);
                message.status = MessageStatus::Errored;
                state.last_error = Some(error);
            }
        }

        let message = message.clone();
        state.emit(TranscriptEvent::Finished {
            index: active.index,
            message,
        });
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        lock(&self.state).transcript.clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).busy
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.state).session.is_some()
    }

    /// Message of the most recent stream failure, until dismissed or the
    /// next accepted submission.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    pub fn dismiss_error(&self) {
        lock(&self.state).last_error = None;
    }

    pub fn session(&self) -> Option<Arc<dyn ChatSession>> {
        lock(&self.state).session.clone()
    }

    /// Receive every transcript mutation from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TranscriptEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.state).subscribers.push(tx);
        rx
    }
}

fn same_session(a: &Arc<dyn ChatSession>, b: &Arc<dyn ChatSession>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Ends the turn when `submit` returns, or as interrupted when the
/// `submit` future is dropped mid-stream.
struct TurnGuard<'a> {
    controller: &'a TranscriptController,
    generation: u64,
    finished: bool,
}

impl TurnGuard<'_> {
    fn finish(mut self, outcome: Result<(), String>) {
        self.finished = true;
        self.controller.finish_turn(self.generation, outcome);
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(generation = self.generation, "submission dropped mid-stream");
            self.controller
                .finish_turn(self.generation, Err(INTERRUPTED.to_string()));
        }
    }
}
