//! AiClient trait implementation for GeminiClient (streaming).

use async_trait::async_trait;
use tracing::debug;

use crate::streaming::{parse_sse_stream, SseEvent};
use crate::{AiClient, AiError, AiResponse, ChunkCallback, Message, TokenUsage};

use super::chunk::parse_chunk;
use super::client::GeminiClient;

#[async_trait]
impl AiClient for GeminiClient {
    async fn send_message_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkCallback,
    ) -> Result<AiResponse, AiError> {
        let body = self.build_request_body(messages);
        let url = self.stream_url();

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Gemini API streaming request"
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        let mut content = String::new();
        let mut finish_reason = None;
        let mut usage = TokenUsage::default();

        parse_sse_stream(response, |event: SseEvent| {
            let chunk = parse_chunk(&event.data)?;

            if let Some(u) = chunk.usage {
                usage = u;
            }
            if chunk.finish_reason.is_some() {
                finish_reason = chunk.finish_reason;
            }
            if !chunk.text.is_empty() {
                content.push_str(&chunk.text);
                on_chunk(chunk.text);
            }
            Ok(())
        })
        .await?;

        debug!(
            model = %self.config.model,
            chars = content.len(),
            finish_reason = finish_reason.as_deref().unwrap_or("none"),
            output_tokens = usage.output_tokens,
            "Gemini stream complete"
        );

        Ok(AiResponse {
            content,
            finish_reason,
            usage,
        })
    }
}
