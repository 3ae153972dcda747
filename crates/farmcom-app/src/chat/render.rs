//! Writes transcript events to a terminal as they happen.

use std::io::{self, Write};

use farmcom_ai::{ChatMessage, ChatRole, MessageStatus, TokenTracker, TranscriptEvent};

const MODEL_PREFIX: &str = "assistant> ";
const USER_PREFIX: &str = "you> ";

/// Prints streamed replies incrementally.
///
/// `Updated` events carry the whole reply so far; only the part not yet
/// printed is written.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    printed: usize,
    streaming: bool,
}

impl TranscriptPrinter {
    pub fn apply<W: Write>(&mut self, out: &mut W, event: &TranscriptEvent) -> io::Result<()> {
        match event {
            TranscriptEvent::Reset { transcript } => {
                self.printed = 0;
                self.streaming = false;
                for message in transcript {
                    write_message(out, message)?;
                }
            }
            TranscriptEvent::Appended { message, .. } => {
                if message.role == ChatRole::Model {
                    out.write_all(MODEL_PREFIX.as_bytes())?;
                    self.printed = 0;
                    self.streaming = true;
                }
            }
            TranscriptEvent::Updated { content, .. } => {
                self.write_tail(out, content)?;
            }
            TranscriptEvent::Finished { message, .. } => {
                if !self.streaming {
                    out.write_all(MODEL_PREFIX.as_bytes())?;
                }
                match message.status {
                    MessageStatus::Errored => {
                        if self.printed > 0 {
                            writeln!(out)?;
                            out.write_all(MODEL_PREFIX.as_bytes())?;
                        }
                        out.write_all(message.content.as_bytes())?;
                    }
                    _ => self.write_tail(out, &message.content)?,
                }
                writeln!(out)?;
                self.printed = 0;
                self.streaming = false;
            }
        }
        out.flush()
    }

    fn write_tail<W: Write>(&mut self, out: &mut W, content: &str) -> io::Result<()> {
        if let Some(tail) = content.get(self.printed..) {
            out.write_all(tail.as_bytes())?;
            self.printed = content.len();
        }
        Ok(())
    }
}

fn write_message<W: Write>(out: &mut W, message: &ChatMessage) -> io::Result<()> {
    let prefix = match message.role {
        ChatRole::User => USER_PREFIX,
        ChatRole::Model => MODEL_PREFIX,
    };
    writeln!(out, "{prefix}{}", message.content)
}

pub fn write_transcript<W: Write>(out: &mut W, transcript: &[ChatMessage]) -> io::Result<()> {
    for message in transcript {
        write_message(out, message)?;
    }
    out.flush()
}

pub fn write_usage<W: Write>(out: &mut W, usage: &TokenTracker) -> io::Result<()> {
    writeln!(
        out,
        "{} calls, {} input + {} output = {} tokens",
        usage.call_count(),
        usage.total().input_tokens,
        usage.total().output_tokens,
        usage.total_tokens(),
    )
}
