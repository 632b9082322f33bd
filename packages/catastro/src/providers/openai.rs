//! OpenAI implementation of the generative fallback provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use catastro::providers::OpenAIGenerativeProvider;
//! use catastro::security::credentials::GenerativeCredentials;
//!
//! let provider = OpenAIGenerativeProvider::from_credentials(
//!     &GenerativeCredentials::new("sk-..."),
//! );
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use openai_client::{ChatRequest, ContentPart, Message, OpenAIClient};
use std::time::Duration;

use super::{GenerationRequest, GenerativeProvider, TextStream};
use crate::error::{ProviderError, ProviderResult};
use crate::security::credentials::GenerativeCredentials;

/// Streams chat completions from OpenAI.
#[derive(Clone)]
pub struct OpenAIGenerativeProvider {
    client: OpenAIClient,
}

impl OpenAIGenerativeProvider {
    pub fn new(client: OpenAIClient) -> Self {
        Self { client }
    }

    /// Build a client from credentials; the key is exposed only here.
    pub fn from_credentials(credentials: &GenerativeCredentials) -> Self {
        let mut client = OpenAIClient::new(credentials.api_key.expose());
        if let Some(url) = &credentials.base_url {
            client = client.with_base_url(url.clone());
        }
        if let Some(timeout) = credentials.request_timeout {
            client = client.with_timeout(timeout);
        }
        Self { client }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

fn chat_request(model: &str, request: &GenerationRequest) -> ChatRequest {
    let user = match &request.attachment {
        Some(attachment) => Message::user_parts(vec![
            ContentPart::text(request.instruction.clone()),
            ContentPart::pdf(attachment.file_name.clone(), &attachment.bytes),
        ]),
        None => Message::user(request.instruction.clone()),
    };

    ChatRequest::new(model)
        .message(Message::system(request.system.clone()))
        .message(user)
        .temperature(request.temperature)
        .token_limit(request.max_tokens)
}

#[async_trait]
impl GenerativeProvider for OpenAIGenerativeProvider {
    async fn stream_completion(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> ProviderResult<TextStream> {
        let stream = self
            .client
            .chat_completion_stream(chat_request(model, request))
            .await?;

        Ok(stream
            .map(|item| item.map(|chunk| chunk.delta).map_err(ProviderError::from))
            .boxed())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
