//! Extraction provider abstractions.
//!
//! Two seams: a primary service that returns structured data for a
//! document, and a text-generation service whose streamed answer contains
//! a JSON object somewhere in its text.

pub mod catastral;
pub mod openai;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderResult;
use crate::types::document_type::DocumentType;
use crate::types::input::DocumentInput;

pub use catastral::CatastralClient;
pub use openai::OpenAIGenerativeProvider;

/// Streamed text deltas from a generation call.
pub type TextStream = BoxStream<'static, ProviderResult<String>>;

/// Result of probing a provider's health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Connectivity {
    Connected { detail: Value },
    Unavailable { detail: String },
}

impl Connectivity {
    pub fn is_connected(&self) -> bool {
        matches!(self, Connectivity::Connected { .. })
    }
}

/// Structured-extraction service.
///
/// Implementations return the raw structured payload; normalization happens
/// in the pipeline. Time budgets are enforced by the caller.
#[async_trait]
pub trait PrimaryProvider: Send + Sync {
    async fn extract(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> ProviderResult<Value>;

    async fn check_connectivity(&self) -> Connectivity;

    /// Label recorded on results produced by this provider.
    fn name(&self) -> &str {
        "primary"
    }
}

/// PDF bytes attached to a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Everything a generation call needs besides the model id.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub instruction: String,
    pub attachment: Option<Attachment>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-generation service with selectable models.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn stream_completion(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> ProviderResult<TextStream>;

    fn name(&self) -> &str {
        "generative"
    }
}
