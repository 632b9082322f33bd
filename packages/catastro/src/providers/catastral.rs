//! HTTP client for the structured-extraction (catastral) service.
//!
//! `POST {base}/extract` takes a multipart `file` plus `document_type` and
//! answers `{ success, confidence, processing_time, data }`.
//! `GET {base}/health` is used for connectivity checks.

use async_trait::async_trait;
use reqwest::{header, multipart, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Connectivity, PrimaryProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::document_type::DocumentType;
use crate::types::input::DocumentInput;

/// Marker some gateways put in a 2xx HTML/text body when the upload is too big.
const SIZE_MARKER: &str = "Request Entity Too Large";

/// Client for the catastral extraction service.
#[derive(Debug, Clone)]
pub struct CatastralClient {
    http: Client,
    base_url: String,
    connectivity_timeout: Duration,
}

impl CatastralClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connectivity_timeout: Duration::from_secs(10),
        }
    }

    /// Use a preconfigured HTTP client (proxies, TLS settings).
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_connectivity_timeout(mut self, timeout: Duration) -> Self {
        self.connectivity_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn probe_health(&self) -> Result<Value, String> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("No se puede conectar al proveedor: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(diagnose_status(status));
        }

        // Any structured payload counts; a non-JSON 2xx still means "up".
        Ok(response.json::<Value>().await.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PrimaryProvider for CatastralClient {
    async fn extract(
        &self,
        input: &DocumentInput,
        document_type: DocumentType,
    ) -> ProviderResult<Value> {
        let part = match input {
            DocumentInput::Pdf { file_name, bytes } => multipart::Part::bytes(bytes.to_vec())
                .file_name(file_name.clone())
                .mime_str("application/pdf"),
            DocumentInput::Text(text) => multipart::Part::text(text.clone())
                .file_name(input.file_name().to_string())
                .mime_str("text/plain; charset=utf-8"),
        }
        .map_err(|e| ProviderError::Network(e.to_string()))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("document_type", document_type.as_str());

        debug!(
            file_name = %input.file_name(),
            bytes = input.len(),
            document_type = %document_type,
            "Sending document to catastral service"
        );

        let response = self
            .http
            .post(format!("{}/extract", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(ProviderError::from_transport)?;

        interpret_response(status, content_type.as_deref(), &body)
    }

    async fn check_connectivity(&self) -> Connectivity {
        match tokio::time::timeout(self.connectivity_timeout, self.probe_health()).await {
            Ok(Ok(detail)) => {
                info!(base_url = %self.base_url, "Catastral service reachable");
                Connectivity::Connected { detail }
            }
            Ok(Err(detail)) => {
                warn!(base_url = %self.base_url, error = %detail, "Catastral service unavailable");
                Connectivity::Unavailable { detail }
            }
            Err(_) => {
                warn!(
                    base_url = %self.base_url,
                    timeout_secs = self.connectivity_timeout.as_secs(),
                    "Catastral health check timed out"
                );
                Connectivity::Unavailable {
                    detail: format!(
                        "Timeout: el proveedor no responde en {} segundos.",
                        self.connectivity_timeout.as_secs()
                    ),
                }
            }
        }
    }

    fn name(&self) -> &str {
        "catastral"
    }
}

/// Classify an answer from the extraction endpoint.
pub(crate) fn interpret_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> ProviderResult<Value> {
    if !status.is_success() {
        let too_large = status == StatusCode::PAYLOAD_TOO_LARGE
            || status
                .canonical_reason()
                .is_some_and(|reason| reason.contains("Too Large"))
            || body.contains("Too Large");
        if too_large {
            info!(status = status.as_u16(), "Catastral service rejected payload size");
            return Err(ProviderError::PayloadTooLarge);
        }
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: openai_client::truncate_to_char_boundary(body, 500).to_string(),
        });
    }

    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if !is_json {
        if body.contains(SIZE_MARKER) {
            info!("Catastral service rejected payload size (text body)");
            return Err(ProviderError::PayloadTooLarge);
        }
        return Err(ProviderError::UnexpectedContentType(
            content_type.unwrap_or("missing").to_string(),
        ));
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    structured_payload(status, parsed)
}

/// Unwrap the `data` envelope, honouring `success: false`.
fn structured_payload(status: StatusCode, body: Value) -> ProviderResult<Value> {
    if body.get("success") == Some(&Value::Bool(false)) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("extraction reported failure");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: message.to_string(),
        });
    }

    match body.get("data") {
        Some(data @ Value::Object(_)) => Ok(data.clone()),
        Some(other) => Err(ProviderError::MalformedResponse(format!(
            "data is not an object: {}",
            other
        ))),
        None if body.is_object() => Ok(body),
        None => Err(ProviderError::MalformedResponse(
            "expected a JSON object".to_string(),
        )),
    }
}

fn diagnose_status(status: StatusCode) -> String {
    let code = status.as_u16();
    let diagnosis = match code {
        404 => "El endpoint /health no existe. ¿Está corriendo el servicio?",
        403 => "Acceso denegado. Verifica permisos CORS.",
        500 => "Error interno del servidor. Revisa los logs del servicio.",
        501..=599 => "Error del servidor. El servicio puede estar caído.",
        _ => "Respuesta inesperada del servicio.",
    };
    format!(
        "HTTP {} {}: {}",
        code,
        status.canonical_reason().unwrap_or(""),
        diagnosis
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json");

    #[test]
    fn test_413_is_size_degradation() {
        let result = interpret_response(StatusCode::PAYLOAD_TOO_LARGE, None, "");
        assert_eq!(result, Err(ProviderError::PayloadTooLarge));
    }

    #[test]
    fn test_size_marker_in_error_body() {
        let result = interpret_response(
            StatusCode::BAD_REQUEST,
            Some("text/html"),
            "<h1>413 Request Entity Too Large</h1>",
        );
        assert_eq!(result, Err(ProviderError::PayloadTooLarge));
    }

    #[test]
    fn test_size_marker_in_non_json_success_body() {
        let result = interpret_response(
            StatusCode::OK,
            Some("text/html"),
            "<html>Request Entity Too Large</html>",
        );
        assert_eq!(result, Err(ProviderError::PayloadTooLarge));
    }

    #[test]
    fn test_other_failures_are_fatal() {
        let status = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, JSON, "{}");
        assert!(matches!(
            status,
            Err(ProviderError::Status { status: 500, .. })
        ));

        let html = interpret_response(StatusCode::OK, Some("text/html"), "<html></html>");
        assert_eq!(
            html,
            Err(ProviderError::UnexpectedContentType("text/html".into()))
        );

        let garbage = interpret_response(StatusCode::OK, JSON, "{not json");
        assert!(matches!(garbage, Err(ProviderError::MalformedResponse(_))));

        for err in [status, html, garbage] {
            assert!(!err.unwrap_err().is_degradation());
        }
    }

    #[test]
    fn test_data_envelope_is_unwrapped() {
        let body = json!({
            "success": true,
            "confidence": 0.92,
            "processing_time": 1.4,
            "data": { "lote": "7" },
        })
        .to_string();

        let payload = interpret_response(StatusCode::OK, JSON, &body).unwrap();
        assert_eq!(payload, json!({ "lote": "7" }));
    }

    #[test]
    fn test_bare_object_is_payload() {
        let payload =
            interpret_response(StatusCode::OK, Some("application/json; charset=utf-8"), r#"{"lote":"7"}"#)
                .unwrap();
        assert_eq!(payload["lote"], "7");
    }

    #[test]
    fn test_success_false_is_fatal() {
        let body = json!({ "success": false, "message": "Solo se aceptan archivos PDF" }).to_string();
        let result = interpret_response(StatusCode::OK, JSON, &body);

        match result {
            Err(ProviderError::Status { body, .. }) => {
                assert_eq!(body, "Solo se aceptan archivos PDF")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_health_diagnosis() {
        assert!(diagnose_status(StatusCode::NOT_FOUND).contains("/health"));
        assert!(diagnose_status(StatusCode::FORBIDDEN).contains("CORS"));
        assert!(diagnose_status(StatusCode::BAD_GATEWAY).contains("caído"));
    }
}
