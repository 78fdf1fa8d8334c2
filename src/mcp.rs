//! MCP agent
//!
//! Exposes the browser binding as MCP tools. Protocol framing, session
//! bookkeeping, and keep-alive are all `rmcp`'s concern; this module wires
//! its SSE transport into the gateway's own routes (`GET /sse`,
//! `POST /sse/message`) and hands the streamable-HTTP transport to the
//! router as a ready-made service for `/mcp`.
//!
//! The agent is an explicitly-constructed value owned by
//! [`crate::state::ServerState`], never ambient global state.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Response, Sse};
use axum::Json;
use futures::StreamExt;
use http::request::Parts;
use http::StatusCode;
use rmcp::model::{
    Annotated, Annotations, CallToolRequestParam, CallToolResult, ClientJsonRpcMessage,
    ListToolsResult, PaginatedRequestParam, RawContent, RawTextContent, ServerCapabilities,
    ServerInfo, ServerJsonRpcMessage, Tool,
};
use rmcp::service::{serve_directly_with_ct, RequestContext};
use rmcp::transport::common::server_side_http::{session_id, SessionId};
use rmcp::transport::sse_server::PostEventQuery;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::{json, Value};
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, PollSender};

use crate::bindings::BrowserBinding;
use crate::extraction::{self, ExtractionTimeouts};
use crate::state::ServerState;

const TOOL_EXTRACT: &str = "extract_form_fields";
const TOOL_SCREENSHOT: &str = "capture_screenshot";

/// Live SSE sessions, keyed by the id advertised in the endpoint event.
/// Each sender feeds client messages into that session's transport.
type SessionStore = Arc<RwLock<HashMap<SessionId, mpsc::Sender<ClientJsonRpcMessage>>>>;

/// Per-connection transport pair: server-to-client sink, client-to-server
/// stream.
type SseTransport = (
    PollSender<ServerJsonRpcMessage>,
    ReceiverStream<ClientJsonRpcMessage>,
);

struct McpAgentInner {
    browser: Arc<dyn BrowserBinding>,
    timeouts: ExtractionTimeouts,
    sessions: SessionStore,
    transport_tx: mpsc::UnboundedSender<SseTransport>,
    sse_ping_interval: Duration,
}

/// Browser-automation MCP agent, constructed once from the browser binding.
#[derive(Clone)]
pub struct McpAgent(Arc<McpAgentInner>);

impl McpAgent {
    pub fn new(browser: Arc<dyn BrowserBinding>, timeouts: ExtractionTimeouts) -> Self {
        let (transport_tx, mut transport_rx) = mpsc::unbounded_channel::<SseTransport>();
        let agent = Self(Arc::new(McpAgentInner {
            browser,
            timeouts,
            sessions: SessionStore::default(),
            transport_tx,
            sse_ping_interval: Duration::from_secs(10),
        }));

        // Each inbound SSE connection yields a transport; serve the agent
        // over it until the client goes away.
        let service = agent.clone();
        let ct = CancellationToken::new();
        tokio::spawn(async move {
            while let Some(transport) = transport_rx.recv().await {
                let server =
                    serve_directly_with_ct(service.clone(), transport, None, ct.child_token());
                tokio::spawn(async move {
                    if let Err(e) = server.waiting().await {
                        tracing::warn!(error = ?e, "mcp sse session ended with error");
                    }
                });
            }
        });

        agent
    }

    /// Streamable-HTTP transport, mounted by the router at `/mcp`.
    pub fn http_service(&self) -> StreamableHttpService<McpAgent, LocalSessionManager> {
        let agent = self.clone();
        StreamableHttpService::new(
            move || Ok(agent.clone()),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig::default(),
        )
    }
}

fn object_schema(value: Value) -> Arc<serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn url_input_schema() -> Arc<serde_json::Map<String, Value>> {
    object_schema(json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "description": "Page to open" }
        },
        "required": ["url"]
    }))
}

fn tool_error(message: String) -> CallToolResult {
    CallToolResult::error(vec![Annotated::new(
        RawContent::Text(RawTextContent {
            text: message,
            meta: None,
        }),
        Some(Annotations::default()),
    )])
}

impl ServerHandler for McpAgent {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Browser automation agent: extract form fields from a page or capture a screenshot."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = vec![
            Tool {
                name: TOOL_EXTRACT.into(),
                title: Some("Extract form fields".to_string()),
                description: Some(
                    "Open a page in a headless browser and list its visible form controls."
                        .into(),
                ),
                input_schema: url_input_schema(),
                output_schema: None,
                annotations: Some(rmcp::model::ToolAnnotations::new()),
                icons: None,
            },
            Tool {
                name: TOOL_SCREENSHOT.into(),
                title: Some("Capture screenshot".to_string()),
                description: Some(
                    "Open a page in a headless browser and capture a full-page PNG.".into(),
                ),
                input_schema: url_input_schema(),
                output_schema: None,
                annotations: Some(rmcp::model::ToolAnnotations::new()),
                icons: None,
            },
        ];

        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        let url = arguments
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ErrorData::invalid_params("missing required argument 'url'", None))?
            .to_string();

        match request.name.as_ref() {
            TOOL_EXTRACT => {
                let report = extraction::extract_from_url(
                    self.0.browser.as_ref(),
                    &url,
                    self.0.timeouts,
                    false,
                )
                .await;

                match report {
                    Ok(report) => Ok(CallToolResult {
                        content: vec![],
                        structured_content: Some(serde_json::to_value(report).map_err(|e| {
                            ErrorData::internal_error(e.to_string(), None)
                        })?),
                        is_error: None,
                        meta: None,
                    }),
                    Err(e) => Ok(tool_error(e.to_string())),
                }
            }
            TOOL_SCREENSHOT => match self.capture_screenshot(&url).await {
                Ok(value) => Ok(CallToolResult {
                    content: vec![],
                    structured_content: Some(value),
                    is_error: None,
                    meta: None,
                }),
                Err(e) => Ok(tool_error(e)),
            },
            other => Err(ErrorData::invalid_request(
                format!("unknown tool '{other}'"),
                None,
            )),
        }
    }
}

impl McpAgent {
    async fn capture_screenshot(&self, url: &str) -> Result<Value, String> {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;

        let session = self
            .0
            .browser
            .launch()
            .await
            .map_err(|e| e.to_string())?;
        let outcome = async {
            session
                .navigate(url, self.0.timeouts.navigation)
                .await
                .map_err(|e| e.to_string())?;
            session
                .screenshot_png()
                .await
                .ok_or_else(|| "screenshot capture failed".to_string())
        }
        .await;
        session.close().await;

        let bytes = outcome?;
        Ok(json!({
            "url": url,
            "screenshot_png_base64": BASE64.encode(bytes),
        }))
    }
}

/// `GET /sse` and `GET /sse/message`: establish an MCP SSE session.
///
/// Advertises the message-post endpoint as the first event, then relays
/// server-to-client JSON-RPC messages.
pub async fn sse_connect(
    State(state): State<Arc<ServerState>>,
    parts: Parts,
) -> Result<impl IntoResponse, Response<String>> {
    let agent = &state.mcp;
    let session = session_id();
    tracing::info!(%session, path = %parts.uri.path(), "mcp sse connection");

    let (from_client_tx, from_client_rx) = mpsc::channel(64);
    let (to_client_tx, to_client_rx) = mpsc::channel(64);
    let to_client_tx_clone = to_client_tx.clone();

    agent
        .0
        .sessions
        .write()
        .await
        .insert(session.clone(), from_client_tx);

    let transport: SseTransport = (
        PollSender::new(to_client_tx),
        ReceiverStream::new(from_client_rx),
    );
    if agent.0.transport_tx.send(transport).is_err() {
        tracing::warn!("mcp transport processor is gone");
        let mut response = Response::new("mcp agent is shut down".to_string());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return Err(response);
    }

    let endpoint = format!("/sse/message?sessionId={session}");
    let stream = futures::stream::once(futures::future::ok(
        Event::default().event("endpoint").data(endpoint),
    ))
    .chain(ReceiverStream::new(to_client_rx).map(|message| {
        match serde_json::to_string(&message) {
            Ok(bytes) => Ok(Event::default().event("message").data(&bytes)),
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }));

    let sessions = agent.0.sessions.clone();
    tokio::spawn(async move {
        to_client_tx_clone.closed().await;
        sessions.write().await.remove(&session);
        tracing::debug!(%session, "mcp sse session closed");
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(agent.0.sse_ping_interval)))
}

/// `POST /sse/message`: forward a client JSON-RPC message into its session.
pub async fn sse_message(
    State(state): State<Arc<ServerState>>,
    Query(PostEventQuery { session_id }): Query<PostEventQuery>,
    parts: Parts,
    Json(mut message): Json<ClientJsonRpcMessage>,
) -> Result<StatusCode, StatusCode> {
    tracing::debug!(%session_id, "mcp client message");
    let tx = {
        let sessions = state.mcp.0.sessions.read().await;
        sessions
            .get(session_id.as_str())
            .ok_or(StatusCode::NOT_FOUND)?
            .clone()
    };

    message.insert_extension(parts);
    if tx.send(message).await.is_err() {
        tracing::warn!(%session_id, "mcp session receiver dropped");
        return Err(StatusCode::GONE);
    }
    Ok(StatusCode::ACCEPTED)
}
