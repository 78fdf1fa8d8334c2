use axum::extract::State;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::state::ServerState;

/// Health check endpoint (liveness)
///
/// Always 200 `"ok"`, regardless of query string or headers.
pub async fn health_check() -> impl IntoResponse {
    "ok"
}

/// Version endpoint
///
/// Returns the configured build identifier, `"local"` when none is set.
pub async fn version(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.config.version_string().to_string()
}
