//! Primary-then-fallback extraction.
//!
//! The primary provider gets one bounded call. A size rejection or timeout
//! hands the document to the fallback chain; any other primary failure is
//! returned as is. Fallback models run one at a time, in configured order.

use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::{json_span, prompts};
use crate::confidence::ConfidenceAggregator;
use crate::error::{ExtractionError, ProviderError, Result};
use crate::normalize::{normalize, ProviderKind};
use crate::providers::{
    Connectivity, GenerationRequest, GenerativeProvider, PrimaryProvider,
};
use crate::types::config::ExtractionConfig;
use crate::types::document::CanonicalDocument;
use crate::types::document_type::DocumentType;
use crate::types::input::DocumentInput;
use crate::types::result::ExtractorResult;

/// Position in the ordered fallback list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    /// Trying the model at this index
    Attempting(usize),
    /// The model at this index produced a payload
    Succeeded(usize),
    /// Every model failed (or none was configured)
    Exhausted,
}

impl FallbackState {
    pub fn start(model_count: usize) -> Self {
        if model_count == 0 {
            FallbackState::Exhausted
        } else {
            FallbackState::Attempting(0)
        }
    }

    /// Transition after an attempt. Terminal states stay put.
    pub fn next(self, succeeded: bool, model_count: usize) -> Self {
        match self {
            FallbackState::Attempting(i) if succeeded => FallbackState::Succeeded(i),
            FallbackState::Attempting(i) if i + 1 < model_count => FallbackState::Attempting(i + 1),
            FallbackState::Attempting(_) => FallbackState::Exhausted,
            terminal => terminal,
        }
    }
}

/// Runs one document through the provider chain and scores the result.
#[derive(Clone)]
pub struct ProviderOrchestrator {
    primary: Arc<dyn PrimaryProvider>,
    fallback: Option<Arc<dyn GenerativeProvider>>,
    aggregator: ConfidenceAggregator,
    config: ExtractionConfig,
}

impl ProviderOrchestrator {
    pub fn new(primary: Arc<dyn PrimaryProvider>) -> Self {
        Self {
            primary,
            fallback: None,
            aggregator: ConfidenceAggregator::default(),
            config: ExtractionConfig::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn GenerativeProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_aggregator(mut self, aggregator: ConfidenceAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &ConfidenceAggregator {
        &self.aggregator
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Extract, normalize and score one document.
    pub async fn extract(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> Result<ExtractorResult> {
        let started = Instant::now();

        match self.call_primary(input, document_type).await {
            Ok(payload) => {
                info!(
                    provider = %self.primary.name(),
                    document_type = %document_type,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Primary extraction succeeded"
                );
                let document = normalize(&payload, ProviderKind::Catastral);
                return Ok(self.finish(document, document_type, self.primary.name()));
            }
            Err(e) if e.is_degradation() => {
                warn!(
                    provider = %self.primary.name(),
                    error = %e,
                    "Primary provider degraded, switching to fallback"
                );
            }
            Err(e) => {
                error!(provider = %self.primary.name(), error = %e, "Primary extraction failed");
                return Err(ExtractionError::Provider(e));
            }
        }

        self.run_fallback(input, document_type).await
    }

    /// Like [`extract`](Self::extract), folding failures into an errored result.
    pub async fn extract_or_error(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> ExtractorResult {
        match self.extract(input, document_type).await {
            Ok(result) => result,
            Err(e) => ExtractorResult::from_error(format!("Error al procesar el documento: {}", e)),
        }
    }

    /// Probe the primary provider within the connectivity budget.
    pub async fn check_connectivity(&self) -> Connectivity {
        let budget = self.config.connectivity_timeout();
        match tokio::time::timeout(budget, self.primary.check_connectivity()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(timeout_secs = budget.as_secs(), "Connectivity check timed out");
                Connectivity::Unavailable {
                    detail: format!(
                        "Timeout: el proveedor no responde en {} segundos.",
                        budget.as_secs()
                    ),
                }
            }
        }
    }

    async fn call_primary(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> std::result::Result<Value, ProviderError> {
        let budget = self.config.primary_timeout();
        match tokio::time::timeout(budget, self.primary.extract(input, document_type)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        }
    }

    async fn run_fallback(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> Result<ExtractorResult> {
        let provider = self.fallback.as_ref().ok_or_else(|| {
            ExtractionError::Configuration(
                "fallback provider not configured (set OPENAI_API_KEY)".to_string(),
            )
        })?;

        let models = &self.config.fallback_models;
        if models.is_empty() {
            return Err(ExtractionError::Configuration(
                "no fallback models configured".to_string(),
            ));
        }

        let request = prompts::generation_request(document_type, input, &self.config);
        let mut state = FallbackState::start(models.len());
        let mut payload = None;
        let mut last_error = String::new();

        while let FallbackState::Attempting(index) = state {
            let model = &models[index];
            info!(model = %model, attempt = index + 1, of = models.len(), "Trying fallback model");

            let outcome = self.attempt_model(provider.as_ref(), model, &request).await;
            state = state.next(outcome.is_ok(), models.len());

            match outcome {
                Ok(value) => payload = Some(value),
                Err(e) => {
                    warn!(model = %model, error = %e, "Fallback model failed");
                    last_error = e.to_string();
                }
            }
        }

        match (state, payload) {
            (FallbackState::Succeeded(index), Some(value)) => {
                info!(model = %models[index], "Fallback extraction succeeded");
                let document = normalize(&value, ProviderKind::Generative);
                let label = format!("{}:{}", provider.name(), models[index]);
                Ok(self.finish(document, document_type, label))
            }
            _ => {
                error!(attempts = models.len(), last_error = %last_error, "All extraction providers exhausted");
                Err(ExtractionError::Exhausted {
                    attempts: models.len(),
                    last_error,
                })
            }
        }
    }

    /// Stream one model's answer and pull the first JSON object out of it.
    async fn attempt_model(
        &self,
        provider: &dyn GenerativeProvider,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<Value> {
        let collect = async {
            let mut stream = provider.stream_completion(model, request).await?;
            let mut text = String::new();
            while let Some(delta) = stream.next().await {
                text.push_str(&delta?);
            }
            Ok::<_, ProviderError>(text)
        };

        let text = match tokio::time::timeout(self.config.generation_timeout(), collect).await {
            Ok(result) => result?,
            Err(_) => return Err(ExtractionError::Provider(ProviderError::Timeout)),
        };

        debug!(model = %model, chars = text.len(), "Collected model output");
        json_span::parse_first_object(text.trim()).map_err(ExtractionError::Parse)
    }

    fn finish(
        &self,
        document: CanonicalDocument,
        document_type: DocumentType,
        provider: impl Into<String>,
    ) -> ExtractorResult {
        let summary = self.aggregator.aggregate(&document, document_type);
        debug!(
            extracted = summary.extracted_count,
            total = summary.total_fields,
            confidence = summary.global_confidence,
            "Scored extraction"
        );
        ExtractorResult::scored(document, summary).with_provider(provider)
    }
}
