//! Transcript controller: the visible conversation and the single-flight
//! discipline around streamed replies.
//!
//! The controller appends a USER message and an empty MODEL message for
//! every accepted submission, then rewrites the MODEL message with the
//! cumulative reply text as chunks arrive. While a reply is streaming,
//! further submissions are ignored.

mod controller;
mod types;

#[cfg(test)]
mod tests;

pub use controller::TranscriptController;
pub use types::{ChatMessage, ChatRole, ControllerSettings, MessageStatus, TranscriptEvent};
