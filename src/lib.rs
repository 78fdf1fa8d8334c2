//! Agent Gateway - HTTP front door for two managed platform services
//!
//! This crate provides a thin HTTP router that forwards requests to a
//! text-generation service (LLM inference, streamed back as an event
//! stream) and a headless-browser service (page automation used for
//! structured form extraction). It also embeds an MCP agent that exposes
//! the browser as remote tools over the protocol's SSE and
//! streamable-HTTP transports.
//!
//! There is deliberately no engine here: inference, browser internals,
//! and MCP framing all belong to external collaborators. The first-party
//! logic is route dispatch, default-filling of request bodies, and the
//! form-scraping closure shipped into the page.
//!
//! # Endpoints
//!
//! - `GET /health` - liveness probe, always `"ok"`
//! - `GET /version` - configured build identifier, `"local"` if unset
//! - `POST /sse` - one-shot generation, streamed as `text/event-stream`
//! - `POST /extract` - form field extraction from a caller-supplied URL
//! - `GET /sse`, `GET /sse/message`, `POST /sse/message` - MCP SSE transport
//! - `ANY /mcp` - MCP streamable-HTTP transport
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use agent_gateway::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     agent_gateway::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod bindings;
pub mod config;
pub mod error;
pub mod extraction;
pub mod mcp;
pub mod middleware;
pub mod routes;
pub mod scrape;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
