//! Conversation sessions.
//!
//! A session is the handle a transcript controller streams turns through.
//! It owns the fixed system instruction and the history of completed
//! turns, and is opened once by the [`SessionFactory`].

mod chat;
mod factory;
mod types;

pub use chat::GeminiSession;
pub use factory::{create_session, SessionFactory};
pub use types::{ChatSession, SessionError};
