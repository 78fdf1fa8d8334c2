//! Route handlers
//!
//! - `health`: liveness and version probes
//! - `generate`: one-shot streamed generation (`POST /sse`)
//! - `extract`: browser form extraction (`POST /extract`)
//!
//! The MCP transport routes live in [`crate::mcp`] since they are thin
//! shims over that agent's own handlers.

pub mod extract;
pub mod generate;
pub mod health;

use crate::error::ServerError;

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
