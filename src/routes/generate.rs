use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

use crate::bindings::{ChatMessage, GenerationRequest};
use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Fixed defaults substituted for absent body fields.
pub const DEFAULT_STREAM: bool = true;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Request body for `POST /sse`. Every field is optional; a malformed or
/// non-JSON body is treated as an empty object, never an error.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,

    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub stream: Option<bool>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl GenerateBody {
    /// Resolve the optional fields into a full generation call.
    ///
    /// Supplied values pass through unchanged, including falsy ones; absent
    /// `messages` synthesize a single user message from `prompt` (empty
    /// string if that is also absent).
    pub fn into_request(self, default_model: &str) -> GenerationRequest {
        let messages = self
            .messages
            .unwrap_or_else(|| vec![ChatMessage::user(self.prompt.unwrap_or_default())]);

        GenerationRequest {
            model: self.model.unwrap_or_else(|| default_model.to_string()),
            messages,
            stream: self.stream.unwrap_or(DEFAULT_STREAM),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

/// `POST /sse`: one-shot generation, streamed back verbatim.
pub async fn generate(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let body: GenerateBody = serde_json::from_slice(&body).unwrap_or_default();
    let request = body.into_request(&state.config.default_model);

    tracing::info!(model = %request.model, stream = request.stream, "generation request");

    let stream = state
        .generation
        .run(request)
        .await
        .map_err(ServerError::Generation)?;

    let body = Body::from_stream(stream.map(|chunk| {
        chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "@cf/meta/llama-3.3-70b-instruct-fp8-fast";

    fn parse(body: &str) -> GenerateBody {
        serde_json::from_slice(body.as_bytes()).unwrap_or_default()
    }

    #[test]
    fn test_empty_body_synthesizes_empty_user_message() {
        let request = parse("{}").into_request(MODEL);
        assert_eq!(request.messages, vec![ChatMessage::user("")]);
        assert_eq!(request.model, MODEL);
        assert!(request.stream);
        assert_eq!(request.max_tokens, 2048);
    }

    #[test]
    fn test_prompt_becomes_user_message() {
        let request = parse(r#"{"prompt":"hello"}"#).into_request(MODEL);
        assert_eq!(request.messages, vec![ChatMessage::user("hello")]);
    }

    #[test]
    fn test_messages_pass_through_unchanged() {
        let request = parse(
            r#"{"messages":[{"role":"system","content":"be terse"},{"role":"user","content":"hi"}],"prompt":"ignored"}"#,
        )
        .into_request(MODEL);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "hi");
    }

    #[test]
    fn test_falsy_values_pass_through() {
        let request = parse(r#"{"stream":false,"max_tokens":0}"#).into_request(MODEL);
        assert!(!request.stream);
        assert_eq!(request.max_tokens, 0);
    }

    #[test]
    fn test_explicit_model_overrides_default() {
        let request = parse(r#"{"model":"@cf/other"}"#).into_request(MODEL);
        assert_eq!(request.model, "@cf/other");
    }

    #[test]
    fn test_malformed_body_treated_as_empty() {
        let request = parse("not json at all").into_request(MODEL);
        assert_eq!(request.messages, vec![ChatMessage::user("")]);
        assert!(request.stream);
    }
}
