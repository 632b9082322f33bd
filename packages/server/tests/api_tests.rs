//! Route tests over mock providers.

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use catastro::testing::{
    MemorySink, MockGenerativeProvider, MockPrimaryCall, MockPrimaryProvider, MockTextExtractor,
};
use catastro::review::SaveReceipt;
use catastro::{
    Connectivity, DocumentSink, DocumentType, ExtractorResult, Field, ProviderError,
    TextExtractionError, WorkspaceEvent,
};
use serde_json::{json, Value};
use server_core::kernel::TestDependencies;
use server_core::server::AppState;
use std::sync::{Arc, Mutex, OnceLock};

use common::{pdf, Part, TestHarness, BOUNDARY};

const PDF: &[u8] = b"%PDF-1.4 escritura de prueba";

fn complete_payload() -> Value {
    json!({
        "expediente_catastral": "12-345-678",
        "lote": "7",
        "manzana": "12",
        "superficie": "250.00 M²",
        "vendedor_nombre": "JUAN GÓMEZ MARTÍNEZ",
        "vendedor_curp": "GOMJ800101HDFRRL05",
        "comprador_nombre": "MARÍA LÓPEZ RUIZ",
        "comprador_curp": "LOPM850212MNLRRR09",
        "tipo_acto": "COMPRAVENTA",
        "numero_escritura": "4521",
        "fecha_escritura": "15/03/2023",
        "valor_operacion": "1250000"
    })
}

// =============================================================================
// Health and config
// =============================================================================

#[tokio::test]
async fn health_reports_connected_primary() {
    let deps = TestDependencies::new(MockPrimaryProvider::new());
    let harness = TestHarness::new(&deps);

    let (status, body) = harness.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["primary_provider"]["status"], "connected");
    assert_eq!(body["fallback_configured"], false);
}

#[tokio::test]
async fn health_is_unavailable_when_primary_is_down() {
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_connectivity(
        Connectivity::Unavailable {
            detail: "No se puede conectar al proveedor".into(),
        },
    ));
    let harness = TestHarness::new(&deps);

    let (status, body) = harness.get("/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["primary_provider"]["status"], "unavailable");
    assert_eq!(
        body["primary_provider"]["detail"],
        "No se puede conectar al proveedor"
    );
}

#[tokio::test]
async fn config_exposes_models_and_timeouts() {
    let deps = TestDependencies::new(MockPrimaryProvider::new())
        .with_generative(MockGenerativeProvider::new());
    let harness = TestHarness::new(&deps);

    let (status, body) = harness.get("/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback_models"], json!(["gpt-4o", "gpt-4o-mini"]));
    assert_eq!(body["primary_timeout_secs"], 30);
    assert_eq!(body["fallback_configured"], true);
    assert_eq!(body["primary_provider_url"], "http://catastral.test");
}

// =============================================================================
// One-shot extraction
// =============================================================================

#[tokio::test]
async fn extract_returns_scored_record() {
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_payload(complete_payload()));
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[pdf("escritura.pdf", PDF), Part::Text("document_type", "propiedad")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["extracted_count"], 12);
    assert_eq!(body["data"]["total_fields"], 35);
    assert_eq!(body["data"]["document"]["informacion_predio"]["lote"], "7");
    assert_eq!(body["data"]["document"]["antecedentes"]["fecha_anterior"], "NO_CONSTA");
    assert_eq!(body["confidence"], body["data"]["global_confidence"]);
    assert_eq!(
        deps.primary.calls(),
        vec![MockPrimaryCall::Extract {
            file_name: "escritura.pdf".into(),
            document_type: DocumentType::Propiedad,
        }]
    );
}

#[tokio::test]
async fn extract_rejects_invalid_uploads() {
    let deps = TestDependencies::new(MockPrimaryProvider::new());
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart("/extract", &[Part::Text("document_type", "propiedad")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = harness
        .post_multipart(
            "/extract",
            &[pdf("escritura.pdf", PDF), Part::Text("document_type", "hipoteca")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[
                Part::File {
                    name: "file",
                    file_name: "foto.jpg",
                    content_type: "image/jpeg",
                    bytes: b"\xff\xd8\xff",
                },
                Part::Text("document_type", "lien"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Formato no soportado. Solo se aceptan PDFs.");

    assert_eq!(deps.primary.extract_count(), 0);
}

#[tokio::test]
async fn extract_without_fallback_is_service_unavailable() {
    let deps =
        TestDependencies::new(MockPrimaryProvider::new().with_error(ProviderError::PayloadTooLarge));
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[pdf("escritura.pdf", PDF), Part::Text("document_type", "propiedad")],
        )
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("configuration"));
}

#[tokio::test]
async fn extract_falls_back_on_size_rejection() {
    let deps =
        TestDependencies::new(MockPrimaryProvider::new().with_error(ProviderError::PayloadTooLarge))
            .with_generative(MockGenerativeProvider::new().with_response(
                "gpt-4o",
                r#"{"informacion_predio": {"lote": "9"}}"#,
            ));
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[pdf("escritura.pdf", PDF), Part::Text("document_type", "gravamen")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["provider"], "mock-generative:gpt-4o");
    assert_eq!(body["data"]["document"]["informacion_predio"]["lote"], "9");
}

#[tokio::test]
async fn extract_fatal_primary_error_is_bad_gateway() {
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_error(
        ProviderError::Status {
            status: 500,
            body: "internal".into(),
        },
    ));
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[pdf("escritura.pdf", PDF), Part::Text("document_type", "propiedad")],
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error al procesar el documento"));
}

#[tokio::test]
async fn extract_from_text_goes_through_text_service() {
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_payload(json!({ "lote": "4" })))
        .with_text_extractor(MockTextExtractor::new());
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[
                pdf("escritura.pdf", PDF),
                Part::Text("document_type", "propiedad"),
                Part::Text("source", "text"),
            ],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["document"]["informacion_predio"]["lote"], "4");
    assert_eq!(
        deps.text_extractor.as_ref().unwrap().calls(),
        vec!["escritura.pdf".to_string()]
    );
    assert_eq!(
        deps.primary.calls(),
        vec![MockPrimaryCall::Extract {
            file_name: "documento.txt".into(),
            document_type: DocumentType::Propiedad,
        }]
    );
}

#[tokio::test]
async fn extract_from_text_maps_text_service_errors() {
    let deps = TestDependencies::new(MockPrimaryProvider::new()).with_text_extractor(
        MockTextExtractor::new().with_error("escaneado.pdf", TextExtractionError::NeedsOcr),
    );
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart(
            "/extract",
            &[
                pdf("escaneado.pdf", PDF),
                Part::Text("document_type", "propiedad"),
                Part::Text("source", "text"),
            ],
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("OCR"));
    assert_eq!(deps.primary.extract_count(), 0);
}

#[tokio::test]
async fn extract_from_text_without_service_is_unavailable() {
    let deps = TestDependencies::new(MockPrimaryProvider::new());
    let harness = TestHarness::new(&deps);

    let (status, _) = harness
        .post_multipart(
            "/extract",
            &[
                pdf("escritura.pdf", PDF),
                Part::Text("document_type", "propiedad"),
                Part::Text("source", "text"),
            ],
        )
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Review workspace
// =============================================================================

#[tokio::test]
async fn workspace_review_cycle() {
    let mut payload = complete_payload();
    payload["vendedor_curp"] = json!("GOMJ8001");
    let sink = MemorySink::new();
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_payload(payload))
        .with_sink(sink.clone());
    let harness = TestHarness::new(&deps);

    let (status, body) = harness
        .post_multipart("/workspace/propiedad/files", &[pdf("escritura.pdf", PDF)])
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["file_id"].is_string());

    let lane = harness.settled_lane("propiedad").await;
    assert_eq!(lane["files"][0]["status"], "completed");
    assert_eq!(lane["can_edit"], true);
    assert_eq!(lane["can_save"], false);
    assert_eq!(lane["source_file"], "escritura.pdf");
    assert_eq!(
        lane["report"]["issues"][0]["field"],
        "titulares.vendedor_curp"
    );

    // Blocked while the CURP is malformed.
    let (status, body) = harness.post_empty("/workspace/propiedad/save").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "Por favor, corrige los errores de validación antes de guardar (1 campos)."
    );

    let (status, _) = harness
        .put_json(
            "/workspace/propiedad/fields",
            json!({ "field": "titulares.curp_vendedor", "value": "X" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, lane) = harness
        .put_json(
            "/workspace/propiedad/fields",
            json!({ "field": "titulares.vendedor_curp", "value": "GOMJ800101HDFRRL05" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lane["can_save"], true);
    assert_eq!(lane["report"]["issues"], json!([]));

    let (status, body) = harness.post_empty("/workspace/propiedad/save").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Datos de \"escritura.pdf\" guardados exitosamente.");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].result.document.titulares.vendedor_curp,
        "GOMJ800101HDFRRL05"
    );

    let (status, _) = harness.post_empty("/workspace/propiedad/save").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, lane) = harness.get("/workspace/propiedad").await;
    assert_eq!(lane["can_upload_another"], true);
}

#[tokio::test]
async fn workspace_rejects_duplicates_and_non_pdf() {
    let deps = TestDependencies::new(MockPrimaryProvider::new());
    let harness = TestHarness::new(&deps);

    let (status, _) = harness
        .post_multipart("/workspace/gravamen/files", &[pdf("gravamen.pdf", PDF)])
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = harness
        .post_multipart("/workspace/gravamen/files", &[pdf("gravamen.pdf", PDF)])
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "El archivo \"gravamen.pdf\" ya ha sido subido para este tipo de documento."
    );

    let (status, _) = harness
        .post_multipart(
            "/workspace/gravamen/files",
            &[Part::File {
                name: "file",
                file_name: "nota.txt",
                content_type: "text/plain",
                bytes: b"hola",
            }],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let lane = harness.settled_lane("gravamen").await;
    let files = lane["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1]["status"], "error");
}

#[tokio::test]
async fn workspace_failed_extraction_records_error() {
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_error(
        ProviderError::Network("connection refused".into()),
    ));
    let harness = TestHarness::new(&deps);

    harness
        .post_multipart("/workspace/propiedad/files", &[pdf("escritura.pdf", PDF)])
        .await;

    let lane = harness.settled_lane("propiedad").await;
    assert_eq!(lane["files"][0]["status"], "error");
    assert_eq!(lane["result"], Value::Null);
    assert_eq!(lane["can_edit"], false);

    let (status, _) = harness
        .put_json(
            "/workspace/propiedad/fields",
            json!({ "field": "informacion_predio.lote", "value": "7" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn workspace_lanes_can_be_cleared() {
    let deps = TestDependencies::new(MockPrimaryProvider::new());
    let harness = TestHarness::new(&deps);

    harness
        .post_multipart("/workspace/propiedad/files", &[pdf("a.pdf", PDF)])
        .await;
    harness
        .post_multipart("/workspace/gravamen/files", &[pdf("b.pdf", PDF)])
        .await;
    harness.settled_lane("propiedad").await;
    harness.settled_lane("gravamen").await;

    let (status, notice) = harness.delete("/workspace/propiedad").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notice["kind"], "cleared");

    let (_, lane) = harness.get("/workspace/propiedad").await;
    assert_eq!(lane["files"], json!([]));
    let (_, lane) = harness.get("/workspace/gravamen").await;
    assert_eq!(lane["files"].as_array().unwrap().len(), 1);

    harness.delete("/workspace").await;
    let (_, lane) = harness.get("/workspace/gravamen").await;
    assert_eq!(lane["files"], json!([]));

    let (status, _) = harness.get("/workspace/hipoteca").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extract_reports_unreadable_form_fields() {
    let deps = TestDependencies::new(MockPrimaryProvider::new());
    let harness = TestHarness::new(&deps);

    // The stream ends inside the document_type part.
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"document_type\"\r\n\r\nprop",
        BOUNDARY
    );
    let (status, body) = harness
        .post_raw(
            "/extract",
            &format!("multipart/form-data; boundary={}", BOUNDARY),
            body.into_bytes(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Formulario inválido"), "{}", message);
    assert_eq!(deps.primary.extract_count(), 0);
}

/// Sink that edits the lane while it is writing.
struct EditingSink {
    state: OnceLock<AppState>,
    persisted: Mutex<Vec<ExtractorResult>>,
}

#[async_trait]
impl DocumentSink for EditingSink {
    async fn save(
        &self,
        result: &ExtractorResult,
        _document_type: DocumentType,
        file_name: &str,
    ) -> catastro::error::ReviewResult<SaveReceipt> {
        self.persisted.lock().unwrap().push(result.clone());
        if let Some(state) = self.state.get() {
            state
                .apply(WorkspaceEvent::FieldEdited {
                    document_type: DocumentType::Propiedad,
                    field: Field::Lote,
                    value: "8".into(),
                })
                .await;
        }
        Ok(SaveReceipt {
            message: format!("Datos de \"{}\" guardados exitosamente.", file_name),
            saved_at: chrono::Utc::now(),
        })
    }
}

#[tokio::test]
async fn workspace_save_is_not_marked_when_edited_mid_save() {
    let deps = TestDependencies::new(MockPrimaryProvider::new().with_payload(complete_payload()));
    let sink = Arc::new(EditingSink {
        state: OnceLock::new(),
        persisted: Mutex::new(Vec::new()),
    });
    let mut server_deps = deps.server_deps();
    server_deps.sink = sink.clone();
    let state = AppState::new(server_deps);
    let _ = sink.state.set(state.clone());
    let harness = TestHarness::from_state(state);

    harness
        .post_multipart("/workspace/propiedad/files", &[pdf("escritura.pdf", PDF)])
        .await;
    let lane = harness.settled_lane("propiedad").await;
    assert_eq!(lane["can_save"], true);

    let (status, body) = harness.post_empty("/workspace/propiedad/save").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "El documento cambió mientras se guardaba. Guarda de nuevo."
    );

    let persisted = sink.persisted.lock().unwrap().clone();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].document.get(Field::Lote), "7");

    let (_, lane) = harness.get("/workspace/propiedad").await;
    assert_eq!(lane["saved"], false);
    assert_eq!(lane["can_save"], true);
    assert_eq!(lane["result"]["document"]["informacion_predio"]["lote"], "8");
}
