//! External collaborator bindings
//!
//! The gateway consumes two managed services through the traits defined
//! here: a text-generation service and a headless-browser service. Both
//! are injected into [`crate::state::ServerState`] at construction so
//! tests can substitute them.

pub mod browser;
pub mod generation;

pub use browser::{BrowserBinding, BrowserSession, HeadlessChromium};
pub use generation::{ChatMessage, EventStream, GenerationBinding, GenerationRequest, WorkersAi};

use std::time::Duration;

/// Failures surfaced by the external bindings.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {0:?}")]
    NavTimeout(Duration),

    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    #[error("generation service call failed: {0}")]
    Upstream(String),
}
