use axum::{extract::Extension, http::StatusCode, Json};
use catastro::Connectivity;
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
    primary_provider: Connectivity,
    fallback_configured: bool,
}

/// Health check endpoint
///
/// Probes the primary extraction provider within the connectivity budget.
/// Returns 200 OK when it is reachable, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let primary = state.deps.orchestrator.check_connectivity().await;
    let is_healthy = primary.is_connected();

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            primary_provider: primary,
            fallback_configured: state.deps.settings.fallback_configured,
        }),
    )
}
