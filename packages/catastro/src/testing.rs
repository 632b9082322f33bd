//! Testing utilities including mock implementations.
//!
//! These let applications exercise the pipeline and the review cycle
//! without network calls. Every mock records its calls for assertions.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::stream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{
    ProviderError, ProviderResult, ReviewError, ReviewResult, TextExtractionError,
    TextExtractionResult,
};
use crate::providers::{
    Connectivity, GenerationRequest, GenerativeProvider, PrimaryProvider, TextStream,
};
use crate::review::sink::{DocumentSink, SaveReceipt};
use crate::text_extraction::{ExtractedText, TextExtractor};
use crate::types::document_type::DocumentType;
use crate::types::input::DocumentInput;
use crate::types::result::ExtractorResult;

// =============================================================================
// Primary provider
// =============================================================================

/// Record of a call made to [`MockPrimaryProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockPrimaryCall {
    Extract {
        file_name: String,
        document_type: DocumentType,
    },
    CheckConnectivity,
}

/// Primary provider with queued responses.
///
/// Responses are handed out in order; once the queue is empty every call
/// returns an empty object.
pub struct MockPrimaryProvider {
    responses: Arc<RwLock<VecDeque<ProviderResult<Value>>>>,
    delay: Option<Duration>,
    connectivity: Arc<RwLock<Connectivity>>,
    calls: Arc<RwLock<Vec<MockPrimaryCall>>>,
}

impl Default for MockPrimaryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPrimaryProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(VecDeque::new())),
            delay: None,
            connectivity: Arc::new(RwLock::new(Connectivity::Connected {
                detail: serde_json::json!({ "status": "ok" }),
            })),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a structured payload.
    pub fn with_payload(self, payload: Value) -> Self {
        self.responses.write().unwrap().push_back(Ok(payload));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ProviderError) -> Self {
        self.responses.write().unwrap().push_back(Err(error));
        self
    }

    /// Sleep this long before answering extract calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_connectivity(self, connectivity: Connectivity) -> Self {
        *self.connectivity.write().unwrap() = connectivity;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockPrimaryCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn extract_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockPrimaryCall::Extract { .. }))
            .count()
    }
}

#[async_trait]
impl PrimaryProvider for MockPrimaryProvider {
    async fn extract(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> ProviderResult<Value> {
        self.calls.write().unwrap().push(MockPrimaryCall::Extract {
            file_name: input.file_name().to_string(),
            document_type,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.responses.write().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(serde_json::json!({})))
    }

    async fn check_connectivity(&self) -> Connectivity {
        self.calls
            .write()
            .unwrap()
            .push(MockPrimaryCall::CheckConnectivity);
        self.connectivity.read().unwrap().clone()
    }

    fn name(&self) -> &str {
        "mock-primary"
    }
}

// =============================================================================
// Generative provider
// =============================================================================

/// Scripted answer for one model.
#[derive(Debug, Clone)]
pub enum ModelScript {
    /// Stream these deltas
    Chunks(Vec<String>),
    /// Fail before streaming
    Fail(ProviderError),
    /// Stream nothing until this much time has passed
    Stall(Duration),
}

/// Record of a call made to [`MockGenerativeProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockGenerationCall {
    pub model: String,
    pub instruction: String,
    pub has_attachment: bool,
}

/// Generative provider with a script per model id.
///
/// Models without a script fail with a 404 status.
#[derive(Default)]
pub struct MockGenerativeProvider {
    scripts: Arc<RwLock<HashMap<String, ModelScript>>>,
    calls: Arc<RwLock<Vec<MockGenerationCall>>>,
}

impl MockGenerativeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer with the whole text as a single delta.
    pub fn with_response(self, model: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_script(model, ModelScript::Chunks(vec![text.into()]))
    }

    /// Answer with these deltas, in order.
    pub fn with_chunks(self, model: impl Into<String>, chunks: &[&str]) -> Self {
        let chunks = chunks.iter().map(|c| c.to_string()).collect();
        self.with_script(model, ModelScript::Chunks(chunks))
    }

    pub fn with_failure(self, model: impl Into<String>, error: ProviderError) -> Self {
        self.with_script(model, ModelScript::Fail(error))
    }

    pub fn with_stall(self, model: impl Into<String>, duration: Duration) -> Self {
        self.with_script(model, ModelScript::Stall(duration))
    }

    pub fn with_script(self, model: impl Into<String>, script: ModelScript) -> Self {
        self.scripts.write().unwrap().insert(model.into(), script);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockGenerationCall> {
        self.calls.read().unwrap().clone()
    }

    /// Model ids in the order they were tried.
    pub fn models_tried(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

#[async_trait]
impl GenerativeProvider for MockGenerativeProvider {
    async fn stream_completion(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> ProviderResult<TextStream> {
        self.calls.write().unwrap().push(MockGenerationCall {
            model: model.to_string(),
            instruction: request.instruction.clone(),
            has_attachment: request.attachment.is_some(),
        });

        let script = self.scripts.read().unwrap().get(model).cloned();
        match script {
            Some(ModelScript::Chunks(chunks)) => {
                Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
            }
            Some(ModelScript::Fail(error)) => Err(error),
            Some(ModelScript::Stall(duration)) => Ok(stream::once(async move {
                tokio::time::sleep(duration).await;
                Ok(String::new())
            })
            .boxed()),
            None => Err(ProviderError::Status {
                status: 404,
                body: format!("model {} not found", model),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-generative"
    }
}

// =============================================================================
// Text extraction
// =============================================================================

/// Text extractor returning a fixed answer per file name.
///
/// Unknown files yield a generic paragraph long enough to pass the
/// minimum text check.
#[derive(Default)]
pub struct MockTextExtractor {
    answers: Arc<RwLock<HashMap<String, TextExtractionResult<String>>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, file_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.answers
            .write()
            .unwrap()
            .insert(file_name.into(), Ok(text.into()));
        self
    }

    pub fn with_error(self, file_name: impl Into<String>, error: TextExtractionError) -> Self {
        self.answers
            .write()
            .unwrap()
            .insert(file_name.into(), Err(error));
        self
    }

    /// File names passed to `extract`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    async fn extract(&self, file_name: &str, bytes: Bytes) -> TextExtractionResult<ExtractedText> {
        self.calls.write().unwrap().push(file_name.to_string());

        let answer = self.answers.read().unwrap().get(file_name).cloned();
        let text = match answer {
            Some(result) => result?,
            None => format!(
                "Texto de prueba extraído del archivo {} para revisión manual.",
                file_name
            ),
        };

        Ok(ExtractedText {
            text,
            file_name: file_name.to_string(),
            size: bytes.len() as u64,
        })
    }
}

// =============================================================================
// Sink
// =============================================================================

/// A record handed to [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecord {
    pub result: ExtractorResult,
    pub document_type: DocumentType,
    pub file_name: String,
}

/// Sink that keeps saved records in memory.
#[derive(Default, Clone)]
pub struct MemorySink {
    records: Arc<RwLock<Vec<SavedRecord>>>,
    fail_with: Arc<RwLock<Option<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every save fail with this message.
    pub fn failing(self, message: impl Into<String>) -> Self {
        *self.fail_with.write().unwrap() = Some(message.into());
        self
    }

    pub fn records(&self) -> Vec<SavedRecord> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn save(
        &self,
        result: &ExtractorResult,
        document_type: DocumentType,
        file_name: &str,
    ) -> ReviewResult<SaveReceipt> {
        if let Some(message) = self.fail_with.read().unwrap().clone() {
            return Err(ReviewError::Sink(message));
        }

        self.records.write().unwrap().push(SavedRecord {
            result: result.clone(),
            document_type,
            file_name: file_name.to_string(),
        });

        Ok(SaveReceipt {
            message: format!("Datos de \"{}\" guardados exitosamente.", file_name),
            saved_at: Utc::now(),
        })
    }
}
