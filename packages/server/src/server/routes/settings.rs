use axum::{extract::Extension, Json};

use crate::kernel::PublicSettings;
use crate::server::app::AppState;

/// Non-secret configuration: provider URLs, models, timeouts and limits.
pub async fn config_handler(Extension(state): Extension<AppState>) -> Json<PublicSettings> {
    Json(state.deps.settings.clone())
}
