//! Client for the PDF text extraction service.
//!
//! The service takes a multipart `file` and answers
//! `{ text, meta: { fileName, size } }`, or `{ error }` with 400 for inputs
//! it refuses and 500 for unexpected failures. The same limits are checked
//! before upload so obviously bad files never leave the process.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{TextExtractionError, TextExtractionResult};
use crate::types::config::ExtractionConfig;
use crate::types::input::looks_like_pdf;

/// Plain text pulled out of a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    text: String,
    meta: SuccessMeta,
}

#[derive(Debug, Deserialize)]
struct SuccessMeta {
    #[serde(rename = "fileName")]
    file_name: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Turns PDF bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, file_name: &str, bytes: Bytes) -> TextExtractionResult<ExtractedText>;
}

/// HTTP client for the text extraction service.
#[derive(Debug, Clone)]
pub struct TextExtractionClient {
    http: Client,
    url: String,
    max_upload_bytes: u64,
    min_text_chars: usize,
}

impl TextExtractionClient {
    pub fn new(url: impl Into<String>) -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            http: Client::new(),
            url: url.into(),
            max_upload_bytes: defaults.max_upload_bytes,
            min_text_chars: defaults.min_text_chars,
        }
    }

    /// Take upload and text limits from the pipeline config.
    pub fn with_config(mut self, config: &ExtractionConfig) -> Self {
        self.max_upload_bytes = config.max_upload_bytes;
        self.min_text_chars = config.min_text_chars;
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Client-side checks mirrored from the service.
    pub fn precheck(&self, file_name: &str, size: u64) -> TextExtractionResult<()> {
        if !looks_like_pdf(file_name, None) {
            return Err(TextExtractionError::NotPdf);
        }
        if size > self.max_upload_bytes {
            return Err(TextExtractionError::TooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    fn classify_rejection(&self, message: &str, size: u64) -> TextExtractionError {
        let lower = message.to_lowercase();
        if lower.contains("contraseña") || lower.contains("password") {
            TextExtractionError::PasswordProtected
        } else if lower.contains("ocr") || lower.contains("escaneado") {
            TextExtractionError::NeedsOcr
        } else if lower.contains("solo se aceptan pdf") || lower.contains("formato no soportado") {
            TextExtractionError::NotPdf
        } else if lower.contains("muy grande") || lower.contains("too large") {
            TextExtractionError::TooLarge {
                size,
                max: self.max_upload_bytes,
            }
        } else {
            TextExtractionError::Rejected(message.to_string())
        }
    }
}

#[async_trait]
impl TextExtractor for TextExtractionClient {
    async fn extract(&self, file_name: &str, bytes: Bytes) -> TextExtractionResult<ExtractedText> {
        let size = bytes.len() as u64;
        self.precheck(file_name, size)?;

        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| TextExtractionError::Unexpected(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        debug!(file_name = %file_name, bytes = size, "Requesting PDF text extraction");

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TextExtractionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TextExtractionError::Network(e.to_string()))?;

        if status == StatusCode::BAD_REQUEST {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            warn!(file_name = %file_name, error = %message, "Text extraction rejected file");
            return Err(self.classify_rejection(&message, size));
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            warn!(file_name = %file_name, status = status.as_u16(), error = %message, "Text extraction failed");
            return Err(TextExtractionError::Unexpected(message));
        }

        let parsed: SuccessBody = serde_json::from_str(&body)
            .map_err(|e| TextExtractionError::Unexpected(format!("invalid response: {}", e)))?;

        let text = parsed.text.trim().to_string();
        if text.chars().count() < self.min_text_chars {
            return Err(TextExtractionError::NeedsOcr);
        }

        Ok(ExtractedText {
            text,
            file_name: parsed.meta.file_name,
            size: parsed.meta.size,
        })
    }
}
