//! Running one uploaded document through the pipeline.

use bytes::Bytes;
use catastro::types::input::looks_like_pdf;
use catastro::{DocumentInput, DocumentType, ExtractionError, ExtractorResult, TextExtractionError};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use super::ServerDeps;

/// A file received over multipart.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    pub fn is_pdf(&self) -> bool {
        looks_like_pdf(&self.file_name, self.content_type.as_deref())
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the pipeline receives for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    /// PDF bytes go to the providers as is
    #[default]
    Pdf,
    /// Text is pulled out of the PDF first
    Text,
}

impl InputSource {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("text") => InputSource::Text,
            _ => InputSource::Pdf,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The caller sent something we will not process
    #[error("{0}")]
    InvalidUpload(String),

    /// A required service is not configured
    #[error("{0}")]
    Unavailable(String),

    /// Extraction ran and failed
    #[error("{0}")]
    Failed(String),
}

impl From<TextExtractionError> for ProcessingError {
    fn from(err: TextExtractionError) -> Self {
        match err {
            TextExtractionError::Unexpected(_) | TextExtractionError::Network(_) => {
                ProcessingError::Failed(err.to_string())
            }
            other => ProcessingError::InvalidUpload(other.to_string()),
        }
    }
}

impl From<ExtractionError> for ProcessingError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Configuration(_) => ProcessingError::Unavailable(err.to_string()),
            other => ProcessingError::Failed(format!("Error al procesar el documento: {}", other)),
        }
    }
}

/// Upload checks shared by every entry point.
pub fn check_upload(deps: &ServerDeps, upload: &Upload) -> Result<(), ProcessingError> {
    if upload.bytes.is_empty() {
        return Err(ProcessingError::InvalidUpload("El archivo está vacío.".to_string()));
    }
    if !upload.is_pdf() {
        return Err(TextExtractionError::NotPdf.into());
    }
    let max = deps.settings.extraction.max_upload_bytes;
    if upload.size() > max {
        return Err(TextExtractionError::TooLarge {
            size: upload.size(),
            max,
        }
        .into());
    }
    Ok(())
}

/// Extract, normalize and score one upload.
pub async fn process_document(
    deps: &ServerDeps,
    upload: Upload,
    document_type: DocumentType,
    source: InputSource,
) -> Result<ExtractorResult, ProcessingError> {
    check_upload(deps, &upload)?;
    let started = Instant::now();

    let input = match source {
        InputSource::Pdf => DocumentInput::pdf(upload.file_name.clone(), upload.bytes),
        InputSource::Text => {
            let extractor = deps.text_extractor.as_ref().ok_or_else(|| {
                ProcessingError::Unavailable(
                    "Servicio de extracción de texto no configurado (TEXT_EXTRACTION_URL)."
                        .to_string(),
                )
            })?;
            let extracted = extractor.extract(&upload.file_name, upload.bytes).await?;
            DocumentInput::text(extracted.text)
        }
    };

    match deps.orchestrator.extract(&input, document_type).await {
        Ok(result) => {
            info!(
                file_name = %upload.file_name,
                document_type = %document_type,
                extracted = %result.extracted_ratio(),
                confidence = result.global_confidence,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Document processed"
            );
            Ok(result)
        }
        Err(e) => {
            warn!(file_name = %upload.file_name, error = %e, "Document processing failed");
            Err(e.into())
        }
    }
}
