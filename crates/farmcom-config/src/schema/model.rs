//! Model service connection settings.

use serde::{Deserialize, Serialize};

pub use farmcom_common::defaults::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL_ID};
use farmcom_common::defaults::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TEMPERATURE,
};

/// Connection and generation settings for the remote model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub id: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub base_url: String,
    /// Valid range: 1-65536.
    pub max_output_tokens: u32,
    /// Valid range: 0.0-2.0.
    pub temperature: f64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL_ID.into(),
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            base_url: DEFAULT_BASE_URL.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
