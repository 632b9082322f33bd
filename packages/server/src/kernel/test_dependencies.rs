// TestDependencies - mock implementations for testing
//
// Builds ServerDeps around the library's mocks so routes can be exercised
// without network calls.

use catastro::testing::{
    MemorySink, MockGenerativeProvider, MockPrimaryProvider, MockTextExtractor,
};
use catastro::{ExtractionConfig, ProviderOrchestrator, TextExtractor};
use std::sync::Arc;

use super::ServerDeps;

pub struct TestDependencies {
    pub primary: Arc<MockPrimaryProvider>,
    pub generative: Option<Arc<MockGenerativeProvider>>,
    pub text_extractor: Option<Arc<MockTextExtractor>>,
    pub sink: MemorySink,
    pub config: ExtractionConfig,
}

impl TestDependencies {
    pub fn new(primary: MockPrimaryProvider) -> Self {
        Self {
            primary: Arc::new(primary),
            generative: None,
            text_extractor: None,
            sink: MemorySink::new(),
            config: ExtractionConfig::default(),
        }
    }

    pub fn with_generative(mut self, generative: MockGenerativeProvider) -> Self {
        self.generative = Some(Arc::new(generative));
        self
    }

    pub fn with_text_extractor(mut self, extractor: MockTextExtractor) -> Self {
        self.text_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn with_sink(mut self, sink: MemorySink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Convert to ServerDeps; the mocks stay shared for assertions.
    pub fn server_deps(&self) -> ServerDeps {
        let mut orchestrator =
            ProviderOrchestrator::new(self.primary.clone()).with_config(self.config.clone());
        if let Some(generative) = &self.generative {
            orchestrator = orchestrator.with_fallback(generative.clone());
        }

        let text_extractor = self
            .text_extractor
            .clone()
            .map(|e| e as Arc<dyn TextExtractor>);

        ServerDeps::new(
            orchestrator,
            text_extractor,
            Arc::new(self.sink.clone()),
            "http://catastral.test",
            self.text_extractor
                .as_ref()
                .map(|_| "http://text.test/api/extract-pdf-text".to_string()),
        )
    }
}
