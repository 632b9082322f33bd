use axum::{
    extract::{Extension, Multipart},
    Json,
};
use catastro::ExtractorResult;
use serde::Serialize;
use std::time::Instant;

use super::form::UploadForm;
use crate::kernel::process_document;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Serialize)]
pub struct ExtractResponse {
    success: bool,
    /// Global confidence, 0-100
    confidence: u8,
    /// Seconds spent in the pipeline
    processing_time: f64,
    data: ExtractorResult,
    message: String,
}

/// One-shot extraction: upload a document, get the scored record back.
///
/// Multipart fields: `file`, `document_type` and optional `source=text`.
pub async fn extract_handler(
    Extension(state): Extension<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let document_type = form.document_type()?;
    let source = form.source();
    let upload = form.take_upload()?;

    tracing::info!(
        file_name = %upload.file_name,
        bytes = upload.size(),
        document_type = %document_type,
        source = ?source,
        "Extraction requested"
    );

    let started = Instant::now();
    let result = process_document(&state.deps, upload, document_type, source).await?;

    Ok(Json(ExtractResponse {
        success: true,
        confidence: result.global_confidence,
        processing_time: started.elapsed().as_secs_f64(),
        message: format!(
            "Extracción completada: {} campos, confianza {}%.",
            result.extracted_ratio(),
            result.global_confidence
        ),
        data: result,
    }))
}
