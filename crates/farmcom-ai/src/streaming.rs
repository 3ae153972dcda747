//! Server-Sent Events (SSE) streaming parser.
//!
//! Gemini's `streamGenerateContent?alt=sse` endpoint delivers one JSON
//! payload per event. The parser is generic over the byte stream so it can
//! be fed from a reqwest response or from in-memory chunks.

use futures_util::{Stream, StreamExt};
use tokio::io::AsyncBufReadExt;
use tokio_util::bytes::Bytes;
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, if the server sent an `event:` field.
    pub event: Option<String>,
    /// The event data (JSON string). Multi-line data is joined with `\n`.
    pub data: String,
}

/// Parse an SSE stream from a reqwest response, calling `on_event` for each event.
///
/// An error returned by `on_event` stops reading and is returned as-is.
pub async fn parse_sse_stream(
    response: reqwest::Response,
    on_event: impl FnMut(SseEvent) -> Result<(), AiError>,
) -> Result<(), AiError> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    parse_sse_bytes(byte_stream, on_event).await
}

/// Parse SSE events from any stream of byte chunks.
///
/// Chunk boundaries may fall anywhere, including inside a line.
pub async fn parse_sse_bytes<S>(
    byte_stream: S,
    mut on_event: impl FnMut(SseEvent) -> Result<(), AiError>,
) -> Result<(), AiError>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    let reader = tokio::io::BufReader::new(StreamReader::new(Box::pin(byte_stream)));
    let mut lines = reader.lines();

    let mut current_event: Option<String> = None;
    let mut current_data = String::new();

    while let Some(line) = lines.next_line().await.map_err(read_error)? {
        if line.is_empty() {
            // Blank line terminates the event
            if !current_data.is_empty() {
                on_event(SseEvent {
                    event: current_event.take(),
                    data: std::mem::take(&mut current_data),
                })?;
            }
            current_event = None;
            continue;
        }

        if let Some(event_type) = field_value(&line, "event") {
            current_event = Some(event_type.to_string());
        } else if let Some(data) = field_value(&line, "data") {
            if !current_data.is_empty() {
                current_data.push('\n');
            }
            current_data.push_str(data);
        }
        // id:, retry: and `:` comments are ignored
    }

    // Flush an event the server did not terminate with a blank line
    if !current_data.is_empty() {
        on_event(SseEvent {
            event: current_event,
            data: current_data,
        })?;
    }

    Ok(())
}

/// `data: x` and `data:x` are both valid; one leading space is dropped.
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn read_error(e: std::io::Error) -> AiError {
    let timed_out = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(reqwest::Error::is_timeout);
    if timed_out {
        AiError::Timeout
    } else {
        AiError::NetworkError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = std::io::Result<Bytes>> {
        let items: Vec<std::io::Result<Bytes>> =
            parts.iter().copied().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        futures_util::stream::iter(items)
    }

    async fn collect(parts: &[&'static str]) -> Result<Vec<SseEvent>, AiError> {
        let mut events = Vec::new();
        parse_sse_bytes(chunks(parts), |event| {
            events.push(event);
            Ok(())
        })
        .await?;
        Ok(events)
    }

    #[tokio::test]
    async fn parses_events_split_across_chunks() {
        let events = collect(&["data: {\"a\"", ":1}\n\nda", "ta: {\"b\":2}\n\n"])
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[1].data, "{\"b\":2}");
    }

    #[tokio::test]
    async fn handles_crlf_and_event_names() {
        let events = collect(&["event: message\r\ndata: hello\r\n\r\n"])
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("message".into()),
                data: "hello".into(),
            }]
        );
    }

    #[tokio::test]
    async fn joins_multi_line_data_and_skips_comments() {
        let events = collect(&[": keep-alive\n", "data:first\ndata: second\nid: 7\n\n"])
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "first\nsecond");
        assert_eq!(events[0].event, None);
    }

    #[tokio::test]
    async fn flushes_unterminated_final_event() {
        let events = collect(&["data: one\n\ndata: two"]).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data, "two");
    }

    #[tokio::test]
    async fn callback_error_stops_parsing() {
        let mut seen = 0;
        let result = parse_sse_bytes(chunks(&["data: 1\n\ndata: 2\n\ndata: 3\n\n"]), |_| {
            seen += 1;
            if seen == 2 {
                Err(AiError::ParseError("bad chunk".into()))
            } else {
                Ok(())
            }
        })
        .await;
        assert!(matches!(result, Err(AiError::ParseError(_))));
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn transport_error_becomes_network_error() {
        let items: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: partial\n\n")),
            Err(std::io::Error::other("connection reset")),
        ];
        let mut events = Vec::new();
        let result = parse_sse_bytes(futures_util::stream::iter(items), |event| {
            events.push(event);
            Ok(())
        })
        .await;
        assert_eq!(events.len(), 1);
        match result {
            Err(AiError::NetworkError(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
