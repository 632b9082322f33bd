//! OpenAI chat completions client
//!
//! A small client for the chat completions endpoint, used as a streaming
//! text-generation backend. User messages can carry a PDF attachment as an
//! inline file part, and responses are consumed as a stream of text deltas.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use openai_client::{ChatRequest, ContentPart, Message, OpenAIClient};
//!
//! let client = OpenAIClient::new(api_key);
//!
//! let request = ChatRequest::new("gpt-4o")
//!     .message(Message::system("Responde únicamente con JSON válido."))
//!     .message(Message::user_parts(vec![
//!         ContentPart::text("Extrae los datos del documento adjunto"),
//!         ContentPart::pdf("escritura.pdf", &pdf_bytes),
//!     ]))
//!     .temperature(0.1);
//!
//! let mut stream = client.chat_completion_stream(request).await?;
//! let mut text = String::new();
//! while let Some(chunk) = stream.next().await {
//!     text.push_str(&chunk?.delta);
//! }
//! ```

pub mod error;
pub mod streaming;
pub mod types;

pub use error::{OpenAIError, Result};
pub use streaming::{ChatCompletionChunk, ChatCompletionStream};
pub use types::*;

use std::time::Duration;

use reqwest::{header, Client};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }

    /// Set a custom base URL (for Azure, proxies, local gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound the whole request, including reading the streamed body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Streaming chat completion.
    ///
    /// Sends the request with `stream: true` and returns the SSE body as a
    /// stream of text deltas.
    pub async fn chat_completion_stream(
        &self,
        request: ChatRequest,
    ) -> Result<ChatCompletionStream> {
        let mut body = serde_json::to_value(&request)
            .map_err(|e| OpenAIError::Parse(format!("Failed to serialize request: {}", e)))?;
        body["stream"] = serde_json::Value::Bool(true);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Opening OpenAI completion stream"
        );

        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::ACCEPT, "text/event-stream")
            .json(&body);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, model = %request.model, "OpenAI streaming request failed");
            OpenAIError::from_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<types::ApiErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            warn!(status = %status, error = %message, "OpenAI streaming API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(ChatCompletionStream::new(response.bytes_stream()))
    }
}
