//! Server dependencies (using traits for testability)
//!
//! Central container handed to every route. External services sit behind
//! the library's provider, text extraction and sink traits so tests can
//! swap in mocks.

use anyhow::Result;
use catastro::{
    CatastralClient, DocumentSink, ExtractionConfig, LoggingSink, OpenAIGenerativeProvider,
    ProviderOrchestrator, TextExtractionClient, TextExtractor,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;

/// Non-secret settings exposed by `GET /config`.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSettings {
    pub primary_provider_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_extraction_url: Option<String>,
    pub fallback_configured: bool,
    #[serde(flatten)]
    pub extraction: ExtractionConfig,
}

/// Server dependencies accessible to routes
#[derive(Clone)]
pub struct ServerDeps {
    pub orchestrator: ProviderOrchestrator,
    /// PDF-to-text service; `source=text` uploads need it
    pub text_extractor: Option<Arc<dyn TextExtractor>>,
    pub sink: Arc<dyn DocumentSink>,
    pub settings: PublicSettings,
}

impl ServerDeps {
    pub fn new(
        orchestrator: ProviderOrchestrator,
        text_extractor: Option<Arc<dyn TextExtractor>>,
        sink: Arc<dyn DocumentSink>,
        primary_provider_url: impl Into<String>,
        text_extraction_url: Option<String>,
    ) -> Self {
        let settings = PublicSettings {
            primary_provider_url: primary_provider_url.into(),
            text_extraction_url,
            fallback_configured: orchestrator.has_fallback(),
            extraction: orchestrator.config().clone(),
        };
        Self {
            orchestrator,
            text_extractor,
            sink,
            settings,
        }
    }

    /// Wire real providers from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let extraction = config.extraction_config();

        let primary = CatastralClient::new(config.catastral_api_url.clone())
            .with_connectivity_timeout(extraction.connectivity_timeout());
        let mut orchestrator =
            ProviderOrchestrator::new(Arc::new(primary)).with_config(extraction.clone());

        match &config.openai {
            Some(credentials) => {
                let provider = OpenAIGenerativeProvider::from_credentials(credentials);
                orchestrator = orchestrator.with_fallback(Arc::new(provider));
                tracing::info!(models = ?extraction.fallback_models, "Fallback provider configured");
            }
            None => {
                tracing::warn!("OPENAI_API_KEY not set; oversized documents cannot be processed");
            }
        }

        let text_extractor = config.text_extraction_url.as_ref().map(|url| {
            Arc::new(TextExtractionClient::new(url.clone()).with_config(&extraction))
                as Arc<dyn TextExtractor>
        });

        Ok(Self::new(
            orchestrator,
            text_extractor,
            Arc::new(LoggingSink),
            config.catastral_api_url.clone(),
            config.text_extraction_url.clone(),
        ))
    }
}
