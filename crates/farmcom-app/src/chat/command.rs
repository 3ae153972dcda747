//! Slash commands typed at the chat prompt.

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    /// Reprint the whole transcript.
    Transcript,
    /// Print cumulative token usage.
    Usage,
    Unknown(String),
    /// Anything that is not a command is sent as a chat message.
    Message(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            "/transcript" => Self::Transcript,
            "/usage" => Self::Usage,
            other if other.starts_with('/') => Self::Unknown(other.to_string()),
            _ => Self::Message(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /transcript  reprint the conversation
  /usage       show token usage
  /help        show this help
  /quit        exit";
