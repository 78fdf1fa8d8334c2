//! Text-generation service binding
//!
//! The generation service is consumed through a single opaque call:
//! `run(model, {messages, stream, max_tokens})` returning a byte stream.
//! The real implementation talks to a Workers-AI-style HTTP endpoint and
//! passes the response body through untouched, so the gateway never
//! interprets the event framing itself.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::BindingError;

/// One role/content pair in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Fully-resolved generation call, after default substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_tokens: u32,
}

/// Raw bytes streamed back from the generation service.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Bytes, BindingError>> + Send>>;

#[async_trait]
pub trait GenerationBinding: Send + Sync {
    /// Invoke the model and return the raw response stream.
    async fn run(&self, request: GenerationRequest) -> Result<EventStream, BindingError>;
}

/// HTTP client for a Workers-AI-style inference endpoint.
///
/// Calls `{base_url}/{account_id}/ai/run/{model}` with a bearer token and
/// streams the response body back verbatim.
pub struct WorkersAi {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
    api_token: String,
}

impl WorkersAi {
    pub fn new(base_url: String, account_id: String, api_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            account_id,
            api_token,
        }
    }

    fn run_url(&self, model: &str) -> String {
        format!(
            "{}/{}/ai/run/{}",
            self.base_url.trim_end_matches('/'),
            self.account_id,
            model
        )
    }
}

#[async_trait]
impl GenerationBinding for WorkersAi {
    async fn run(&self, request: GenerationRequest) -> Result<EventStream, BindingError> {
        let url = self.run_url(&request.model);
        tracing::debug!(model = %request.model, stream = request.stream, "calling generation service");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "messages": request.messages,
                "stream": request.stream,
                "max_tokens": request.max_tokens,
            }))
            .send()
            .await
            .map_err(|e| BindingError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| BindingError::Upstream(e.to_string()))?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| BindingError::Upstream(e.to_string())));

        Ok(Box::pin(stream))
    }
}
