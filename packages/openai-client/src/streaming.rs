//! SSE streaming parser for chat completions.
//!
//! Turns the raw `reqwest` byte stream into text deltas. Lines may arrive
//! split across network chunks, so bytes are buffered until a full line is
//! available. A `data: [DONE]` line ends the stream.

use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::OpenAIError;

/// A single chunk from a streaming chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionChunk {
    /// The text delta for this chunk.
    pub delta: String,
    /// Whether the stream is done.
    pub done: bool,
}

#[derive(Debug, serde::Deserialize)]
struct StreamChunkRaw {
    #[serde(default)]
    choices: Vec<StreamChoiceRaw>,
    #[serde(default)]
    error: Option<StreamErrorRaw>,
}

#[derive(Debug, serde::Deserialize)]
struct StreamChoiceRaw {
    delta: DeltaRaw,
}

#[derive(Debug, serde::Deserialize)]
struct DeltaRaw {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct StreamErrorRaw {
    message: String,
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Stream adapter that converts raw SSE bytes into `ChatCompletionChunk` values.
pub struct ChatCompletionStream {
    inner: ByteStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl ChatCompletionStream {
    /// Wrap a byte stream. Public so callers can replay recorded SSE bodies.
    pub fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            finished: false,
        }
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<ChatCompletionChunk, OpenAIError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            if let Some(parsed) = next_event(&mut this.buffer) {
                if matches!(parsed, Ok(ChatCompletionChunk { done: true, .. })) {
                    this.finished = true;
                }
                return Poll::Ready(Some(parsed));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(OpenAIError::from_transport(e))));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    // A final line without trailing newline still counts.
                    if !this.buffer.is_empty() {
                        this.buffer.push(b'\n');
                        if let Some(parsed) = next_event(&mut this.buffer) {
                            return Poll::Ready(Some(parsed));
                        }
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Pop complete lines off the buffer until one yields an event.
fn next_event(buffer: &mut Vec<u8>) -> Option<Result<ChatCompletionChunk, OpenAIError>> {
    loop {
        let newline_pos = buffer.iter().position(|b| *b == b'\n')?;
        let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

        let line = match std::str::from_utf8(&line_bytes) {
            Ok(line) => line.trim(),
            Err(e) => {
                return Some(Err(OpenAIError::Parse(format!(
                    "Invalid UTF-8 in stream: {}",
                    e
                ))))
            }
        };

        // Blank lines separate events; "event:", "id:" and comments carry nothing we use.
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == "[DONE]" {
            return Some(Ok(ChatCompletionChunk {
                delta: String::new(),
                done: true,
            }));
        }

        return Some(parse_data(data));
    }
}

fn parse_data(data: &str) -> Result<ChatCompletionChunk, OpenAIError> {
    let raw: StreamChunkRaw = serde_json::from_str(data).map_err(|e| {
        OpenAIError::Parse(format!(
            "Failed to parse stream chunk: {} (data: {})",
            e,
            crate::types::truncate_to_char_boundary(data, 200)
        ))
    })?;

    if let Some(err) = raw.error {
        return Err(OpenAIError::Api {
            status: 200,
            message: err.message,
        });
    }

    let delta = raw
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .unwrap_or_default();

    Ok(ChatCompletionChunk { delta, done: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn byte_chunks(chunks: &[&str]) -> Vec<Result<Bytes, reqwest::Error>> {
        chunks
            .iter()
            .map(|chunk| Ok(Bytes::from(chunk.to_string())))
            .collect()
    }

    async fn collect(chunks: &[&str]) -> Vec<Result<ChatCompletionChunk, OpenAIError>> {
        let stream = ChatCompletionStream::new(futures::stream::iter(byte_chunks(chunks)));
        stream.collect().await
    }

    #[tokio::test]
    async fn test_deltas_then_done() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"lote\\\"\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\": \\\"12\\\"}\"}}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        let text: String = items
            .iter()
            .map(|item| item.as_ref().unwrap().delta.clone())
            .collect();
        assert_eq!(text, "{\"lote\": \"12\"}");
        assert!(items.last().unwrap().as_ref().unwrap().done);
    }

    #[tokio::test]
    async fn test_line_split_across_network_chunks() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"Manzana 4\"}}]}\n",
            "\ndata: [DONE]\n",
        ])
        .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().delta, "Manzana 4");
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        // "ñ" is two bytes; split it between network chunks.
        let first = b"data: {\"choices\":[{\"delta\":{\"content\":\"Ca\xc3".to_vec();
        let second = b"\xb1ada\"}}]}\n".to_vec();
        let stream = ChatCompletionStream::new(futures::stream::iter(vec![
            Ok(Bytes::from(first)),
            Ok(Bytes::from(second)),
        ]));
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items[0].as_ref().unwrap().delta, "Cañada");
    }

    #[tokio::test]
    async fn test_nothing_after_done() {
        let items = collect(&[
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        ])
        .await;

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_delta() {
        let items = collect(&["data: {\"choices\":[{\"delta\":{}}]}\n", "data: [DONE]\n"]).await;

        assert_eq!(items[0].as_ref().unwrap().delta, "");
    }

    #[tokio::test]
    async fn test_error_event_surfaces_as_api_error() {
        let items = collect(&["data: {\"error\":{\"message\":\"context length exceeded\"}}\n"]).await;

        match &items[0] {
            Err(OpenAIError::Api { message, .. }) => {
                assert!(message.contains("context length"))
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let items = collect(&["data: {\"choices\":[{\"delta\":{\"content\":\"fin\"}}]}"]).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta, "fin");
    }
}
