//! Opens Gemini sessions from the environment credential.

use std::time::Duration;

use farmcom_common::defaults::{
    DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_OUTPUT_TOKENS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TEMPERATURE,
};
use farmcom_common::ConfigError;
use tracing::info;

use crate::gemini::{GeminiClient, GeminiConfig};

use super::chat::GeminiSession;
use super::types::SessionError;

/// Builds [`GeminiSession`]s. Connection settings are fixed per factory;
/// the credential is read from the environment on every `create_session`.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    api_key_env: String,
    base_url: String,
    max_output_tokens: u32,
    temperature: f64,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for SessionFactory {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl SessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment variable holding the API key.
    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Open a session for `model_id` with a fixed `system_instruction`.
    ///
    /// Fails with `SessionError::Configuration` when the credential is
    /// missing or blank, and with `SessionError::Init` for anything else.
    /// No request is sent.
    pub fn create_session(
        &self,
        system_instruction: &str,
        model_id: &str,
    ) -> Result<GeminiSession, SessionError> {
        let api_key = self.read_api_key()?;
        let model = normalize_model_id(model_id)?;

        if system_instruction.trim().is_empty() {
            return Err(SessionError::Init(
                "system instruction must not be empty".into(),
            ));
        }

        let config = GeminiConfig::new(api_key)
            .with_model(model)
            .with_base_url(self.base_url.clone())
            .with_max_tokens(self.max_output_tokens)
            .with_temperature(self.temperature)
            .with_timeouts(self.connect_timeout, self.request_timeout);
        let client = GeminiClient::new(config).map_err(|e| SessionError::Init(e.to_string()))?;

        info!(model, "Gemini session opened");
        Ok(GeminiSession::new(client, model, system_instruction))
    }

    fn read_api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if key.trim().is_empty() => {
                Err(ConfigError::InvalidCredential(self.api_key_env.clone()))
            }
            Ok(key) => Ok(key.trim().to_string()),
            Err(_) => Err(ConfigError::MissingCredential(self.api_key_env.clone())),
        }
    }
}

/// Open a session with the default factory (`GEMINI_API_KEY`, public endpoint).
pub fn create_session(
    system_instruction: &str,
    model_id: &str,
) -> Result<GeminiSession, SessionError> {
    SessionFactory::default().create_session(system_instruction, model_id)
}

/// Accepts `gemini-2.0-flash` or `models/gemini-2.0-flash`.
fn normalize_model_id(model_id: &str) -> Result<&str, SessionError> {
    let trimmed = model_id.trim();
    let id = trimmed.strip_prefix("models/").unwrap_or(trimmed);

    if id.is_empty() {
        return Err(SessionError::Init("model identifier is empty".into()));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
    {
        return Err(SessionError::Init(format!(
            "malformed model identifier {model_id:?}: unexpected character {bad:?}"
        )));
    }
    Ok(id)
}
