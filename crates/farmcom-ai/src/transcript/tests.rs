//! Tests for the transcript controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use farmcom_common::defaults::{DEFAULT_ERROR_MESSAGE, DEFAULT_GREETING};
use tokio::sync::Notify;

use super::*;
use crate::session::ChatSession;
use crate::{AiError, AiResponse, ChunkCallback};

const QUESTION: &str = "When should I plant wheat?";

/// Streams a fixed list of chunks, then succeeds or fails. When gated, it
/// holds the stream open after the chunks until the gate is notified.
struct ScriptedSession {
    chunks: Vec<&'static str>,
    failure: Mutex<Option<&'static str>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedSession {
    fn replying(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            failure: Mutex::new(None),
            gate: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(chunks: Vec<&'static str>, error: &'static str) -> Self {
        let session = Self::replying(chunks);
        session.fail_with(error);
        session
    }

    fn fail_with(&self, error: &'static str) {
        *self.failure.lock().unwrap() = Some(error);
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatSession for ScriptedSession {
    fn model(&self) -> &str {
        "scripted"
    }

    fn system_instruction(&self) -> &str {
        "You are a farm advisor."
    }

    async fn send_message_streaming(
        &self,
        text: &str,
        on_chunk: ChunkCallback,
    ) -> Result<AiResponse, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(text.to_string());

        for chunk in &self.chunks {
            on_chunk(chunk.to_string());
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let failure = *self.failure.lock().unwrap();
        match failure {
            Some(msg) => Err(AiError::NetworkError(msg.into())),
            None => Ok(AiResponse {
                content: self.chunks.concat(),
                finish_reason: Some("STOP".into()),
                ..AiResponse::default()
            }),
        }
    }
}

fn initialized(session: &Arc<ScriptedSession>) -> Arc<TranscriptController> {
    let controller = Arc::new(TranscriptController::default());
    controller.initialize(session.clone());
    controller
}

async fn wait_until_busy(controller: &TranscriptController) {
    for _ in 0..1000 {
        if controller.is_busy() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("submission never started");
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<TranscriptEvent>) -> Vec<TranscriptEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn initialize_seeds_greeting() {
    let session = Arc::new(ScriptedSession::replying(vec![]));
    let controller = initialized(&session);

    assert_eq!(
        controller.transcript(),
        vec![ChatMessage {
            role: ChatRole::Model,
            content: DEFAULT_GREETING.to_string(),
            status: MessageStatus::Complete,
        }]
    );
    assert!(!controller.is_busy());
    assert!(controller.is_initialized());
    assert_eq!(controller.last_error(), None);
}

#[tokio::test]
async fn submit_streams_reply_into_transcript() {
    let session = Arc::new(ScriptedSession::replying(vec!["Plant wheat ", "in early fall."]));
    let controller = initialized(&session);

    controller.submit(QUESTION).await;

    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].content, DEFAULT_GREETING);
    assert_eq!(transcript[1], ChatMessage::user(QUESTION));
    assert_eq!(transcript[2], ChatMessage::model("Plant wheat in early fall."));
    assert!(!controller.is_busy());
    assert_eq!(controller.last_error(), None);
    assert_eq!(*session.prompts.lock().unwrap(), vec![QUESTION.to_string()]);
}

#[tokio::test]
async fn stream_failure_replaces_partial_text_with_fallback() {
    let session = Arc::new(ScriptedSession::failing(vec!["Par"], "connection reset"));
    let controller = initialized(&session);

    controller.submit("test").await;

    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].content, "test");
    assert_eq!(transcript[2].content, DEFAULT_ERROR_MESSAGE);
    assert_eq!(transcript[2].status, MessageStatus::Errored);
    assert!(controller
        .last_error()
        .is_some_and(|e| e.contains("connection reset")));
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn submit_while_busy_is_a_noop() {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(
        ScriptedSession::replying(vec!["Plant wheat ", "in early fall."]).gated(gate.clone()),
    );
    let controller = initialized(&session);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(QUESTION).await })
    };
    wait_until_busy(&controller).await;

    let during = controller.transcript();
    assert_eq!(during.len(), 3);
    assert_eq!(during[2].content, "Plant wheat in early fall.");
    assert_eq!(during[2].status, MessageStatus::Streaming);

    controller.submit("a").await;
    assert_eq!(controller.transcript(), during);
    assert!(controller.is_busy());
    assert_eq!(session.calls(), 1);

    gate.notify_one();
    first.await.unwrap();

    assert!(!controller.is_busy());
    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].status, MessageStatus::Complete);
}

#[tokio::test]
async fn blank_submissions_are_ignored() {
    let session = Arc::new(ScriptedSession::replying(vec!["unused"]));
    let controller = initialized(&session);

    controller.submit("").await;
    controller.submit("   ").await;
    controller.submit("\n\t").await;

    assert_eq!(controller.transcript().len(), 1);
    assert!(!controller.is_busy());
    assert_eq!(session.calls(), 0);
}

#[tokio::test]
async fn submit_before_initialize_is_ignored() {
    let controller = TranscriptController::default();
    controller.submit(QUESTION).await;

    assert!(controller.transcript().is_empty());
    assert!(!controller.is_busy());
    assert!(!controller.is_initialized());
}

#[tokio::test]
async fn user_text_is_trimmed_before_sending() {
    let session = Arc::new(ScriptedSession::replying(vec!["ok"]));
    let controller = initialized(&session);

    controller.submit("  how much water for tomatoes?\n").await;

    assert_eq!(
        controller.transcript()[1].content,
        "how much water for tomatoes?"
    );
    assert_eq!(
        *session.prompts.lock().unwrap(),
        vec!["how much water for tomatoes?".to_string()]
    );
}

#[tokio::test]
async fn chunks_accumulate_in_delivery_order() {
    let chunks = vec!["Ro", "tate ", "beans ", "after ", "corn", "."];
    let session = Arc::new(ScriptedSession::replying(chunks.clone()));
    let controller = initialized(&session);
    let mut events = controller.subscribe();

    controller.submit("What follows corn?").await;

    let updates: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            TranscriptEvent::Updated { index: 2, content } => Some(content),
            _ => None,
        })
        .collect();

    let mut expected = Vec::new();
    let mut running = String::new();
    for chunk in &chunks {
        running.push_str(chunk);
        expected.push(running.clone());
    }
    assert_eq!(updates, expected);
    assert_eq!(controller.transcript()[2].content, chunks.concat());
}

#[tokio::test]
async fn subscribers_see_mutations_in_order() {
    let session = Arc::new(ScriptedSession::replying(vec!["a", "b"]));
    let controller = TranscriptController::default();
    let mut events = controller.subscribe();

    controller.initialize(session.clone());
    controller.submit("hi").await;

    let greeting = ChatMessage::model(DEFAULT_GREETING);
    assert_eq!(
        drain(&mut events),
        vec![
            TranscriptEvent::Reset {
                transcript: vec![greeting],
            },
            TranscriptEvent::Appended {
                index: 1,
                message: ChatMessage::user("hi"),
            },
            TranscriptEvent::Appended {
                index: 2,
                message: ChatMessage::pending_reply(),
            },
            TranscriptEvent::Updated {
                index: 2,
                content: "a".into(),
            },
            TranscriptEvent::Updated {
                index: 2,
                content: "ab".into(),
            },
            TranscriptEvent::Finished {
                index: 2,
                message: ChatMessage::model("ab"),
            },
        ]
    );
}

#[tokio::test]
async fn transcript_length_is_odd_whenever_idle() {
    let ok = Arc::new(ScriptedSession::replying(vec!["Yes."]));
    let controller = initialized(&ok);
    assert_eq!(controller.transcript().len() % 2, 1);

    for question in ["Is it too dry?", "Should I irrigate?", "Tonight?"] {
        controller.submit(question).await;
        assert!(!controller.is_busy());
        assert_eq!(controller.transcript().len() % 2, 1);
    }
    assert_eq!(controller.transcript().len(), 7);

    let failing = Arc::new(ScriptedSession::failing(vec![], "HTTP 500"));
    controller.initialize(failing.clone());
    controller.submit("Still there?").await;
    assert_eq!(controller.transcript().len(), 3);
}

#[tokio::test]
async fn roles_alternate_after_the_greeting() {
    let session = Arc::new(ScriptedSession::replying(vec!["Sure."]));
    let controller = initialized(&session);

    controller.submit("one").await;
    controller.submit("two").await;

    let roles: Vec<ChatRole> = controller.transcript().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            ChatRole::Model,
            ChatRole::User,
            ChatRole::Model,
            ChatRole::User,
            ChatRole::Model,
        ]
    );
    assert!(controller.transcript().iter().all(|m| !m.is_active()));
}

#[tokio::test]
async fn next_submission_clears_last_error() {
    let failing = Arc::new(ScriptedSession::failing(vec![], "HTTP 503"));
    let controller = initialized(&failing);

    controller.submit("first").await;
    assert!(controller.last_error().is_some());

    controller.dismiss_error();
    assert_eq!(controller.last_error(), None);

    controller.submit("second").await;
    assert!(controller.last_error().is_some());

    let ok = Arc::new(ScriptedSession::replying(vec!["fine"]));
    controller.initialize(ok.clone());
    controller.submit("third").await;
    assert_eq!(controller.last_error(), None);
}

#[tokio::test]
async fn earlier_messages_survive_a_failed_turn() {
    let session = Arc::new(ScriptedSession::replying(vec!["Early fall."]));
    let controller = initialized(&session);
    controller.submit(QUESTION).await;
    let before = controller.transcript();

    session.fail_with("reset");
    controller.submit("And barley?").await;

    let after = controller.transcript();
    assert_eq!(&after[..3], &before[..]);
    assert_eq!(after[4].content, DEFAULT_ERROR_MESSAGE);
}

#[tokio::test]
async fn dropped_submission_is_finalized_as_errored() {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(ScriptedSession::replying(vec!["Par"]).gated(gate));
    let controller = initialized(&session);

    let result =
        tokio::time::timeout(Duration::from_millis(20), controller.submit(QUESTION)).await;
    assert!(result.is_err());

    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].content, DEFAULT_ERROR_MESSAGE);
    assert_eq!(transcript[2].status, MessageStatus::Errored);
    assert!(!controller.is_busy());
    assert!(controller
        .last_error()
        .is_some_and(|e| e.contains("interrupted")));
}

#[tokio::test]
async fn reinitialize_orphans_the_streaming_turn() {
    let gate = Arc::new(Notify::new());
    let slow = Arc::new(ScriptedSession::replying(vec!["Par"]).gated(gate.clone()));
    let controller = initialized(&slow);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(QUESTION).await })
    };
    wait_until_busy(&controller).await;

    let fresh = Arc::new(ScriptedSession::replying(vec!["Hi."]));
    controller.initialize(fresh.clone());
    assert!(!controller.is_busy());
    assert_eq!(controller.transcript().len(), 1);

    gate.notify_one();
    first.await.unwrap();

    assert_eq!(controller.transcript().len(), 1);
    assert!(!controller.is_busy());
    assert_eq!(controller.last_error(), None);

    controller.submit("hello").await;
    assert_eq!(controller.transcript()[2].content, "Hi.");
}

#[tokio::test]
async fn reinitialize_with_same_session_waits_for_its_open_stream() {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(ScriptedSession::replying(vec!["Par"]).gated(gate.clone()));
    let controller = initialized(&session);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(QUESTION).await })
    };
    wait_until_busy(&controller).await;

    controller.initialize(session.clone());
    assert_eq!(controller.transcript().len(), 1);
    assert!(controller.is_busy());

    controller.submit("again").await;
    assert_eq!(session.calls(), 1);
    assert_eq!(controller.transcript().len(), 1);

    gate.notify_one();
    first.await.unwrap();
    assert!(!controller.is_busy());
    assert_eq!(controller.transcript().len(), 1);
    assert_eq!(controller.last_error(), None);

    // The gate is still in place; leave a permit so the next turn completes.
    gate.notify_one();
    controller.submit("again").await;
    assert_eq!(session.calls(), 2);
    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].content, "again");
    assert_eq!(transcript[2], ChatMessage::model("Par"));
}

#[tokio::test]
async fn reinitialize_twice_with_same_session_still_waits() {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(ScriptedSession::replying(vec![]).gated(gate.clone()));
    let controller = initialized(&session);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(QUESTION).await })
    };
    wait_until_busy(&controller).await;

    controller.initialize(session.clone());
    controller.initialize(session.clone());
    assert!(controller.is_busy());

    gate.notify_one();
    first.await.unwrap();
    assert!(!controller.is_busy());
    assert_eq!(session.calls(), 1);
}

#[tokio::test]
async fn empty_reply_completes_with_empty_content() {
    let session = Arc::new(ScriptedSession::replying(vec![]));
    let controller = initialized(&session);

    controller.submit("anything?").await;

    let reply = &controller.transcript()[2];
    assert_eq!(reply.content, "");
    assert_eq!(reply.status, MessageStatus::Complete);
}

#[tokio::test]
async fn custom_settings_are_used() {
    let settings = ControllerSettings {
        greeting: "Welcome to the co-op helpdesk.".into(),
        error_message: "Service unavailable.".into(),
    };
    let controller = TranscriptController::new(settings.clone());
    let failing = Arc::new(ScriptedSession::failing(vec![], "boom"));
    controller.initialize(failing.clone());

    controller.submit("hi").await;

    let transcript = controller.transcript();
    assert_eq!(transcript[0].content, settings.greeting);
    assert_eq!(transcript[2].content, settings.error_message);
    assert_eq!(controller.settings(), &settings);
}
