//! Typed view of one streamed `GenerateContentResponse` payload.
//!
//! The service's JSON is loosely shaped; every payload is validated here
//! before its text reaches a caller.

use serde::Deserialize;

use crate::{AiError, TokenUsage};

/// Finish reasons that mean the reply was withheld rather than completed.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Validated content of one stream payload.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct StreamChunk {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Parse and validate one SSE `data:` payload.
///
/// A payload is accepted when its first candidate has at least one text
/// part, or when it only closes the stream (a non-blocking finish reason
/// or a usage-only trailer). Everything else is an error.
pub(crate) fn parse_chunk(data: &str) -> Result<StreamChunk, AiError> {
    let response: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| AiError::ParseError(format!("malformed stream chunk: {e}")))?;

    if let Some(err) = response.error {
        let status = err.status.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(AiError::ApiError(format!(
            "{status} ({}): {}",
            err.code, err.message
        )));
    }

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AiError::Blocked(format!("prompt blocked: {reason}")));
    }

    let usage = response.usage_metadata.map(|meta| TokenUsage {
        input_tokens: meta.prompt_token_count,
        output_tokens: meta.candidates_token_count,
    });

    let Some(candidate) = response.candidates.into_iter().next() else {
        return match usage {
            Some(_) => Ok(StreamChunk {
                usage,
                ..StreamChunk::default()
            }),
            None => Err(AiError::ParseError("stream chunk has no candidates".into())),
        };
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(AiError::Blocked(format!("response stopped: {reason}")));
        }
    }

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if texts.is_empty() && candidate.finish_reason.is_none() {
        return Err(AiError::ParseError("stream chunk has no text".into()));
    }

    Ok(StreamChunk {
        text: texts.concat(),
        finish_reason: candidate.finish_reason,
        usage,
    })
}
