//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use catastro::{DocumentType, LaneView, Notice, Workspace, WorkspaceEvent};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    clear_all_handler, clear_lane_handler, config_handler, edit_field_handler, extract_handler,
    health_handler, save_handler, upload_handler, workspace_handler,
};

/// Multipart overhead allowed on top of the upload limit
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub workspace: Arc<RwLock<Workspace>>,
}

impl AppState {
    pub fn new(deps: ServerDeps) -> Self {
        let workspace = Workspace::new(deps.orchestrator.aggregator().clone());
        Self {
            deps: Arc::new(deps),
            workspace: Arc::new(RwLock::new(workspace)),
        }
    }

    /// Apply one event to the shared workspace.
    pub async fn apply(&self, event: WorkspaceEvent) -> Option<Notice> {
        let mut guard = self.workspace.write().await;
        let current = std::mem::take(&mut *guard);
        let (next, notice) = current.reduce(event);
        *guard = next;
        notice
    }

    pub async fn view(&self, document_type: DocumentType) -> LaneView {
        self.workspace.read().await.view(document_type)
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // CORS configuration - allow any origin unless a list is configured
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);
    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    };

    let body_limit = state.deps.settings.extraction.max_upload_bytes as usize + MULTIPART_SLACK_BYTES;

    Router::new()
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .route("/extract", post(extract_handler))
        .route("/workspace", delete(clear_all_handler))
        .route(
            "/workspace/:document_type",
            get(workspace_handler).delete(clear_lane_handler),
        )
        .route("/workspace/:document_type/files", post(upload_handler))
        .route("/workspace/:document_type/fields", put(edit_field_handler))
        .route("/workspace/:document_type/save", post(save_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
