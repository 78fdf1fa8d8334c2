use std::sync::Arc;

use crate::bindings::{
    BrowserBinding, GenerationBinding, HeadlessChromium, WorkersAi,
};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::extraction::ExtractionTimeouts;
use crate::mcp::McpAgent;

/// Shared application state
///
/// Both platform bindings are explicit trait objects injected at
/// construction, so tests can substitute them without touching the router.
#[derive(Clone)]
pub struct ServerState {
    /// Gateway configuration
    pub config: Arc<ServerConfig>,

    /// Text-generation service handle
    pub generation: Arc<dyn GenerationBinding>,

    /// Browser-automation service handle
    pub browser: Arc<dyn BrowserBinding>,

    /// MCP agent, constructed once from the browser binding
    pub mcp: McpAgent,
}

impl ServerState {
    /// Create state with the real platform bindings.
    ///
    /// Both bindings are required; a missing generation account or token is
    /// a deployment-configuration error surfaced at startup.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let account_id = config
            .account_id
            .clone()
            .ok_or_else(|| ServerError::Config("account_id is not configured".to_string()))?;
        let api_token = config
            .api_token
            .clone()
            .ok_or_else(|| ServerError::Config("api_token is not configured".to_string()))?;

        let generation = Arc::new(WorkersAi::new(
            config.generation_base_url.clone(),
            account_id,
            api_token,
        ));
        let browser = Arc::new(HeadlessChromium::new(
            config.browser_executable.clone(),
            config.browser_headless,
        ));

        Ok(Self::with_bindings(config, generation, browser))
    }

    /// Create state around caller-supplied bindings.
    pub fn with_bindings(
        config: ServerConfig,
        generation: Arc<dyn GenerationBinding>,
        browser: Arc<dyn BrowserBinding>,
    ) -> Self {
        let timeouts = ExtractionTimeouts {
            navigation: config.navigation_timeout(),
            form_wait: config.form_wait(),
        };
        let mcp = McpAgent::new(browser.clone(), timeouts);

        Self {
            config: Arc::new(config),
            generation,
            browser,
            mcp,
        }
    }

    /// Fixed timeouts applied by the extraction pipeline.
    pub fn extraction_timeouts(&self) -> ExtractionTimeouts {
        ExtractionTimeouts {
            navigation: self.config.navigation_timeout(),
            form_wait: self.config.form_wait(),
        }
    }
}
