//! Review workspace API.
//!
//! Uploads are tracked per document type; extraction runs in a spawned
//! task and lands in the workspace when done. Clients poll the lane.

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    Json,
};
use catastro::{
    save_reviewed, DocumentType, ExtractorResult, Field, LaneView, Notice, NoticeKind,
    ReviewError, WorkspaceEvent,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::form::{parse_document_type, UploadForm};
use crate::kernel::{process_document, InputSource, Upload};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Serialize)]
pub struct UploadAccepted {
    pub file_id: Uuid,
    pub message: String,
}

#[derive(Deserialize)]
pub struct EditFieldRequest {
    /// Qualified `section.field` path
    pub field: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub saved_at: DateTime<Utc>,
}

/// Current lane with derived flags.
pub async fn workspace_handler(
    Extension(state): Extension<AppState>,
    Path(document_type): Path<String>,
) -> Result<Json<LaneView>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    Ok(Json(state.view(document_type).await))
}

/// Track an upload and start processing it.
pub async fn upload_handler(
    Extension(state): Extension<AppState>,
    Path(document_type): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAccepted>), ApiError> {
    let document_type = parse_document_type(&document_type)?;
    let mut form = UploadForm::read(multipart).await?;
    let source = form.source();
    let upload = form.take_upload()?;
    let file_id = Uuid::new_v4();

    let notice = state
        .apply(WorkspaceEvent::FileSubmitted {
            document_type,
            file_id,
            name: upload.file_name.clone(),
            size: upload.size(),
            is_pdf: upload.is_pdf(),
        })
        .await;

    if let Some(notice) = notice {
        let status = match notice.kind {
            NoticeKind::Duplicate => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        return Err(ApiError::new(status, notice.description));
    }

    info!(file_id = %file_id, file_name = %upload.file_name, document_type = %document_type, "Upload accepted");
    start_processing(&state, document_type, file_id, upload, source).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAccepted {
            file_id,
            message: "Procesando...".to_string(),
        }),
    ))
}

/// Move the file to Processing and spawn extraction.
///
/// Nothing is spawned when the workspace refuses the transition, e.g. the
/// lane was cleared after the upload was tracked.
pub async fn start_processing(
    state: &AppState,
    document_type: DocumentType,
    file_id: Uuid,
    upload: Upload,
    source: InputSource,
) -> Result<(), ApiError> {
    if let Some(notice) = state
        .apply(WorkspaceEvent::ProcessingStarted {
            document_type,
            file_id,
        })
        .await
    {
        warn!(file_id = %file_id, message = %notice.description, "Processing not started");
        return Err(ApiError::conflict(notice.description));
    }

    tokio::spawn(run_processing(
        state.clone(),
        document_type,
        file_id,
        upload,
        source,
    ));
    Ok(())
}

async fn run_processing(
    state: AppState,
    document_type: DocumentType,
    file_id: Uuid,
    upload: Upload,
    source: InputSource,
) {
    let outcome = match process_document(&state.deps, upload, document_type, source).await {
        Ok(result) => result,
        Err(e) => ExtractorResult::from_error(e.to_string()),
    };

    let notice = state
        .apply(WorkspaceEvent::ExtractionFinished {
            document_type,
            file_id,
            outcome,
        })
        .await;

    match notice {
        Some(notice) if notice.is_error() => {
            warn!(file_id = %file_id, message = %notice.description, "Processing finished with error")
        }
        Some(notice) => info!(file_id = %file_id, message = %notice.description, "Processing finished"),
        None => {}
    }
}

/// Apply a manual edit and return the revalidated lane.
pub async fn edit_field_handler(
    Extension(state): Extension<AppState>,
    Path(document_type): Path<String>,
    Json(request): Json<EditFieldRequest>,
) -> Result<Json<LaneView>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    let field = Field::from_path(&request.field)
        .ok_or_else(|| ApiError::from(ReviewError::UnknownField(request.field.clone())))?;

    if let Some(notice) = state
        .apply(WorkspaceEvent::FieldEdited {
            document_type,
            field,
            value: request.value,
        })
        .await
    {
        return Err(ApiError::conflict(notice.description));
    }

    Ok(Json(state.view(document_type).await))
}

/// Persist the reviewed record once every rule passes.
pub async fn save_handler(
    Extension(state): Extension<AppState>,
    Path(document_type): Path<String>,
) -> Result<Json<SaveResponse>, ApiError> {
    let document_type = parse_document_type(&document_type)?;

    let view = state.view(document_type).await;
    if view.is_processing {
        return Err(ApiError::conflict("Hay archivos en proceso. Espera a que terminen."));
    }
    if view.lane.saved {
        return Err(ApiError::conflict("Los datos ya fueron guardados."));
    }

    let (result, file_name) = state.workspace.read().await.prepare_save(document_type)?;
    let receipt = save_reviewed(state.deps.sink.as_ref(), &result, document_type, &file_name).await?;

    // The workspace only marks the lane saved if it still holds what was persisted.
    if let Some(notice) = state
        .apply(WorkspaceEvent::Saved {
            document_type,
            snapshot: result,
            message: receipt.message.clone(),
        })
        .await
    {
        if notice.kind != NoticeKind::Saved {
            warn!(document_type = %document_type, message = %notice.description, "Saved record is stale");
            return Err(ApiError::conflict(notice.description));
        }
    }

    Ok(Json(SaveResponse {
        success: true,
        message: receipt.message,
        saved_at: receipt.saved_at,
    }))
}

pub async fn clear_lane_handler(
    Extension(state): Extension<AppState>,
    Path(document_type): Path<String>,
) -> Result<Json<Option<Notice>>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    Ok(Json(
        state
            .apply(WorkspaceEvent::LaneCleared { document_type })
            .await,
    ))
}

pub async fn clear_all_handler(Extension(state): Extension<AppState>) -> Json<Option<Notice>> {
    Json(state.apply(WorkspaceEvent::AllCleared).await)
}
