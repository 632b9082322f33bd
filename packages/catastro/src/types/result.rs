use chrono::{DateTime, Utc};
use serde::Serialize;

use super::document::{CanonicalDocument, TOTAL_FIELDS};
use crate::confidence::ConfidenceSummary;

/// Outcome of one extraction run.
///
/// A run is either a complete normalized document (`error = false`) or an
/// error carrying a message; an errored result's document and confidence
/// hold no information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractorResult {
    pub document: CanonicalDocument,
    pub extracted_count: usize,
    pub total_fields: usize,
    pub global_confidence: u8,
    pub timestamp: DateTime<Utc>,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Which provider produced the document (e.g. `catastral`, `openai:gpt-4o`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ExtractorResult {
    /// Successful result from a scored document.
    pub fn scored(document: CanonicalDocument, summary: ConfidenceSummary) -> Self {
        Self {
            document,
            extracted_count: summary.extracted_count,
            total_fields: summary.total_fields,
            global_confidence: summary.global_confidence,
            timestamp: Utc::now(),
            error: false,
            error_message: None,
            provider: None,
        }
    }

    /// Failed run.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            document: CanonicalDocument::empty(),
            extracted_count: 0,
            total_fields: TOTAL_FIELDS,
            global_confidence: 0,
            timestamp: Utc::now(),
            error: true,
            error_message: Some(message.into()),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Replace counts and confidence after the document changed.
    pub fn rescore(&mut self, summary: ConfidenceSummary) {
        self.extracted_count = summary.extracted_count;
        self.total_fields = summary.total_fields;
        self.global_confidence = summary.global_confidence;
    }

    /// `"extraidos/total"`
    pub fn extracted_ratio(&self) -> String {
        format!("{}/{}", self.extracted_count, self.total_fields)
    }
}
