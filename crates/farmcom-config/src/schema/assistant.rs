//! Fixed texts of the assistant: system instruction, greeting, fallback.

use serde::{Deserialize, Serialize};

pub use farmcom_common::defaults::{DEFAULT_ERROR_MESSAGE, DEFAULT_GREETING};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are FarmCom Assistant, an agricultural expert \
helping farmers. Answer questions about crops, planting schedules, soil health, pest and \
disease control, irrigation, weather, and farm equipment. Keep answers practical, concise, \
and suited to small and medium farms.";


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub system_instruction: String,
    /// First MODEL message shown before any user turn.
    pub greeting: String,
    /// Replaces a reply whose stream failed.
    pub error_message: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.into(),
            greeting: DEFAULT_GREETING.into(),
            error_message: DEFAULT_ERROR_MESSAGE.into(),
        }
    }
}
