use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{ServerError, ServerResult};
use crate::extraction;
use crate::state::ServerState;

/// Request body for `POST /extract`. Only `url` is meaningful; a malformed
/// body parses as an empty object and fails the `url` requirement below.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractBody {
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /extract`: open a browser session, scrape the page's form
/// controls, and return the JSON report.
///
/// The session is closed exactly once whatever happens after launch;
/// navigation and evaluation failures propagate as 5xx after the close.
pub async fn extract(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let body: ExtractBody = serde_json::from_slice(&body).unwrap_or_default();
    let url = body
        .url
        .ok_or_else(|| ServerError::BadRequest("Missing 'url'".to_string()))?;

    tracing::info!(%url, "extraction request");

    let report = extraction::extract_from_url(
        state.browser.as_ref(),
        &url,
        state.extraction_timeouts(),
        true,
    )
    .await?;

    Ok(Json(report))
}
