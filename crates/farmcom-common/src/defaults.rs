//! Default settings shared by the config schema and the AI crate.

pub const DEFAULT_MODEL_ID: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// First MODEL message of every transcript.
pub const DEFAULT_GREETING: &str = "Hello! I'm your FarmCom assistant. Ask me anything about \
crops, soil, weather, or farm equipment.";

/// Shown in place of a reply whose stream failed.
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
