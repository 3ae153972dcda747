//! Gemini API client struct and request building.

use crate::{AiError, Message, Role};

use super::config::GeminiConfig;

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the JSON request body for the Gemini API.
    pub(crate) fn build_request_body(&self, messages: &[Message]) -> serde_json::Value {
        let mut contents = Vec::new();

        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Model => "model",
                Role::System => continue, // sent as systemInstruction
            };
            contents.push(serde_json::json!({
                "role": role,
                "parts": [{ "text": msg.content }]
            }));
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(system) = messages.iter().find(|m| m.role == Role::System) {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system.content }]
            });
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig::new("test-key")).unwrap()
    }

    #[test]
    fn stream_url_uses_sse_endpoint() {
        let client = GeminiClient::new(
            GeminiConfig::new("k")
                .with_model("gemini-1.5-flash")
                .with_base_url("http://localhost:1234/"),
        )
        .unwrap();
        assert_eq!(
            client.stream_url(),
            "http://localhost:1234/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn stream_url_never_carries_the_key() {
        let url = client().stream_url();
        assert!(!url.contains("test-key"));
    }

    #[test]
    fn request_body_maps_roles_and_system_instruction() {
        let messages = vec![
            Message::new(Role::System, "You are a farm advisor."),
            Message::new(Role::User, "When should I sow maize?"),
            Message::new(Role::Model, "After the last frost."),
            Message::new(Role::User, "And wheat?"),
        ];
        let body = client().build_request_body(&messages);

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "And wheat?");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a farm advisor."
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn request_body_without_system_message() {
        let body = client().build_request_body(&[Message::new(Role::User, "hi")]);
        assert!(body.get("systemInstruction").is_none());
    }
}
