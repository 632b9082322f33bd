//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Budget for one primary provider call, in seconds.
    ///
    /// Exceeding it is a degradation: the fallback chain takes over.
    /// Default: 30.
    pub primary_timeout_secs: u64,

    /// Budget for a provider connectivity check, in seconds. Default: 10.
    pub connectivity_timeout_secs: u64,

    /// Budget for one fallback model, covering the whole streamed answer.
    ///
    /// Default: 120.
    pub generation_timeout_secs: u64,

    /// Fallback models, tried in order, one at a time.
    ///
    /// Default: `["gpt-4o", "gpt-4o-mini"]`.
    pub fallback_models: Vec<String>,

    /// Sampling temperature for fallback models. Default: 0.1.
    pub temperature: f32,

    /// Completion token budget for fallback models. Default: 4000.
    pub max_tokens: u32,

    /// Largest accepted upload, in bytes. Default: 30 MiB.
    pub max_upload_bytes: u64,

    /// Minimum characters of extracted text before a PDF is considered
    /// scanned. Default: 50.
    pub min_text_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            primary_timeout_secs: 30,
            connectivity_timeout_secs: 10,
            generation_timeout_secs: 120,
            fallback_models: vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
            temperature: 0.1,
            max_tokens: 4000,
            max_upload_bytes: 30 * 1024 * 1024,
            min_text_chars: 50,
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_timeout(mut self, timeout: Duration) -> Self {
        self.primary_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_connectivity_timeout(mut self, timeout: Duration) -> Self {
        self.connectivity_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout_secs = timeout.as_secs();
        self
    }

    /// Replace the fallback model list. Blank entries are dropped.
    pub fn with_fallback_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_models = models
            .into_iter()
            .map(Into::into)
            .filter(|m: &String| !m.trim().is_empty())
            .collect();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn primary_timeout(&self) -> Duration {
        Duration::from_secs(self.primary_timeout_secs)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}
