//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catastro::ReviewError;
use serde_json::json;

use crate::kernel::ProcessingError;

/// Error returned by a route: a status and a user-facing message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        let status = match &err {
            ProcessingError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ProcessingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProcessingError::Failed(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        let status = match &err {
            ReviewError::SaveBlocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewError::UnknownField(_) => StatusCode::BAD_REQUEST,
            ReviewError::UnknownFile(_) => StatusCode::NOT_FOUND,
            ReviewError::NoResult(_)
            | ReviewError::FailedExtraction(_)
            | ReviewError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ReviewError::Sink(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}
