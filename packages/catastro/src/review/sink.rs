//! Persistence of reviewed records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{ReviewError, ReviewResult};
use crate::types::document_type::DocumentType;
use crate::types::result::ExtractorResult;

/// Acknowledgement from a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub message: String,
    pub saved_at: DateTime<Utc>,
}

/// Destination for reviewed records.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn save(
        &self,
        result: &ExtractorResult,
        document_type: DocumentType,
        file_name: &str,
    ) -> ReviewResult<SaveReceipt>;
}

/// Sink that writes the record to the log and keeps nothing.
#[derive(Debug, Clone, Default)]
pub struct LoggingSink;

#[async_trait]
impl DocumentSink for LoggingSink {
    async fn save(
        &self,
        result: &ExtractorResult,
        document_type: DocumentType,
        file_name: &str,
    ) -> ReviewResult<SaveReceipt> {
        let record = serde_json::to_string(result).map_err(|e| ReviewError::Sink(e.to_string()))?;
        info!(
            file_name = %file_name,
            document_type = %document_type,
            extracted = %result.extracted_ratio(),
            confidence = result.global_confidence,
            record = %record,
            "Saving reviewed record"
        );

        Ok(SaveReceipt {
            message: format!("Datos de \"{}\" guardados exitosamente.", file_name),
            saved_at: Utc::now(),
        })
    }
}
