//! Typed errors for the extraction pipeline.
//!
//! Library errors use `thiserror`. Provider failures carry enough shape for
//! the orchestrator to tell an expected degradation (size limit, timeout)
//! apart from a fatal failure.

use thiserror::Error;
use uuid::Uuid;

use crate::review::status::FileStatus;
use crate::types::document_type::DocumentType;

/// Errors raised by a single extraction provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Connection failed, reset, DNS
    #[error("network error: {0}")]
    Network(String),

    /// The call did not finish within its time budget
    #[error("provider timed out")]
    Timeout,

    /// The provider rejected the input because of its size
    #[error("payload too large for provider")]
    PayloadTooLarge,

    /// Non-2xx response that is not a size rejection
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be read or did not have the expected shape
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// 2xx response that was not JSON
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),
}

impl ProviderError {
    /// Size-limit and timeout failures send the orchestrator to the fallback
    /// chain; everything else is fatal.
    pub fn is_degradation(&self) -> bool {
        matches!(self, Self::Timeout | Self::PayloadTooLarge)
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<openai_client::OpenAIError> for ProviderError {
    fn from(err: openai_client::OpenAIError) -> Self {
        use openai_client::OpenAIError;
        match err {
            OpenAIError::Timeout => Self::Timeout,
            OpenAIError::Network(msg) => Self::Network(msg),
            OpenAIError::Api { status, message } if status == 413 => {
                tracing::debug!(error = %message, "Generative provider rejected payload size");
                Self::PayloadTooLarge
            }
            OpenAIError::Api { status, message } => Self::Status {
                status,
                body: message,
            },
            OpenAIError::Parse(msg) => Self::MalformedResponse(msg),
        }
    }
}

/// Errors surfaced by the extraction pipeline as a whole.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Fatal primary provider failure
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Model output held no well-formed object
    #[error("no structured object in model output: {0}")]
    Parse(String),

    /// Missing credentials or settings; no fallback possible
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every fallback model failed
    #[error("all extraction providers exhausted after {attempts} attempts (last error: {last_error})")]
    Exhausted { attempts: usize, last_error: String },
}

/// Errors from the text extraction service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TextExtractionError {
    #[error("Formato no soportado. Solo se aceptan PDFs.")]
    NotPdf,

    #[error("Archivo muy grande ({size} bytes). Máximo {max} bytes.")]
    TooLarge { size: u64, max: u64 },

    #[error("El PDF está protegido con contraseña.")]
    PasswordProtected,

    #[error("Este PDF no contiene texto extraíble. Parece ser escaneado (requiere OCR).")]
    NeedsOcr,

    /// 400 answer we could not classify further
    #[error("text extraction rejected the file: {0}")]
    Rejected(String),

    /// 5xx or an unreadable answer
    #[error("unexpected text extraction failure: {0}")]
    Unexpected(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Errors from the review cycle (editing, status, persistence).
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Save attempted while revalidation still reports failures
    #[error("Por favor, corrige los errores de validación antes de guardar ({invalid} campos).")]
    SaveBlocked { invalid: usize },

    #[error("no extraction result for {0}")]
    NoResult(DocumentType),

    /// The lane holds an errored run, not a document
    #[error("extraction failed, nothing to save: {0}")]
    FailedExtraction(String),

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: FileStatus, to: FileStatus },

    #[error("unknown file: {0}")]
    UnknownFile(Uuid),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("save failed: {0}")]
    Sink(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type alias for text extraction.
pub type TextExtractionResult<T> = std::result::Result<T, TextExtractionError>;

/// Result type alias for review operations.
pub type ReviewResult<T> = std::result::Result<T, ReviewError>;
