//! Extraction orchestration
//!
//! Drives a browser session through navigate / wait / scrape / screenshot
//! and resolves the raw in-page records into the report returned by
//! `POST /extract` and the MCP `extract_form_fields` tool.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::bindings::{BrowserBinding, BrowserSession};
use crate::error::{ServerError, ServerResult};
use crate::scrape::{
    self, FieldGroup, FormField, ScrapeResult, COLLECT_FORM_FIELDS_JS, FORM_READY_PATTERN,
};

/// Report produced by a successful extraction.
#[derive(Debug, Serialize)]
pub struct ExtractionReport {
    pub url: String,
    pub extracted_at: String,
    pub fields: Vec<FormField>,
    pub groups: Vec<FieldGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_png_base64: Option<String>,
}

/// Fixed timeouts applied to the navigate and form-ready waits.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionTimeouts {
    pub navigation: Duration,
    pub form_wait: Duration,
}

/// Acquire a session, run the scrape sequence, and close the session
/// exactly once whether or not the sequence succeeded.
pub async fn extract_from_url(
    browser: &dyn BrowserBinding,
    url: &str,
    timeouts: ExtractionTimeouts,
    with_screenshot: bool,
) -> ServerResult<ExtractionReport> {
    let session = browser.launch().await.map_err(ServerError::Browser)?;
    let outcome = scrape_page(session.as_ref(), url, timeouts, with_screenshot).await;
    session.close().await;
    outcome
}

async fn scrape_page(
    session: &dyn BrowserSession,
    url: &str,
    timeouts: ExtractionTimeouts,
    with_screenshot: bool,
) -> ServerResult<ExtractionReport> {
    session
        .navigate(url, timeouts.navigation)
        .await
        .map_err(ServerError::Browser)?;

    if !session
        .wait_for_text(FORM_READY_PATTERN, timeouts.form_wait)
        .await
    {
        tracing::debug!(%url, "form-ready pattern not seen, scraping anyway");
    }

    let raw = session
        .evaluate(COLLECT_FORM_FIELDS_JS)
        .await
        .map_err(ServerError::Browser)?;
    let result: ScrapeResult = serde_json::from_value(raw)
        .map_err(|e| ServerError::Internal(format!("malformed scrape result: {e}")))?;

    let screenshot_png_base64 = if with_screenshot {
        session
            .screenshot_png()
            .await
            .map(|bytes| BASE64.encode(bytes))
    } else {
        None
    };

    Ok(ExtractionReport {
        url: url.to_string(),
        extracted_at: chrono::Utc::now().to_rfc3339(),
        fields: result.fields.into_iter().map(scrape::resolve_field).collect(),
        groups: result.groups.into_iter().map(scrape::resolve_group).collect(),
        screenshot_png_base64,
    })
}
