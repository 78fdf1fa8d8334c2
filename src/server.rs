//! Server initialization and routing
//!
//! Builds the axum router over the shared state, wires the MCP transports,
//! and runs the listener with graceful shutdown.

use crate::config::ServerConfig;
use crate::mcp;
use crate::middleware::{log_requests, request_id};
use crate::routes::{extract, generate, health, not_found};
use crate::state::ServerState;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum router with all routes and middleware
///
/// Route dispatch is the whole of the first-party logic:
/// - `/health`, `/version`: fixed responses
/// - `POST /sse`: generation passthrough
/// - `GET /sse`, `GET /sse/message`, `POST /sse/message`: MCP SSE transport
/// - `/mcp` (any method): MCP streamable-HTTP transport
/// - `POST /extract`: browser form extraction
/// - everything else: 404
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    // Every method router carries its own 404 fallback: a known path with
    // an unhandled method is indistinguishable from an unknown path.
    Router::new()
        .route("/health", get(health::health_check).fallback(not_found))
        .route("/version", get(health::version).fallback(not_found))
        .route(
            "/sse",
            get(mcp::sse_connect)
                .post(generate::generate)
                .fallback(not_found),
        )
        .route(
            "/sse/message",
            get(mcp::sse_connect)
                .post(mcp::sse_message)
                .fallback(not_found),
        )
        .route_service("/mcp", state.mcp.http_service())
        .route("/extract", post(extract::extract).fallback(not_found))
        .fallback(not_found)
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server
///
/// Initializes logging, constructs the platform bindings from the
/// configuration, and serves until SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .json()
        .init();

    let state = Arc::new(ServerState::new(config.clone()).map_err(|e| anyhow::anyhow!("{e}"))?);
    let app = build_router(state);

    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        version = config.version_string(),
        model = %config.default_model,
        "starting agent gateway on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("received SIGTERM, shutting down..."),
    }
}
