use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Build identifier reported by GET /version
    #[serde(default)]
    pub version: Option<String>,

    /// Model used when the request body names none
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base URL of the generation service
    #[serde(default = "default_generation_base_url")]
    pub generation_base_url: String,

    /// Account identifier for the generation service
    #[serde(default)]
    pub account_id: Option<String>,

    /// Bearer token for the generation service
    #[serde(default)]
    pub api_token: Option<String>,

    /// Explicit Chromium executable path (auto-detected if unset)
    #[serde(default)]
    pub browser_executable: Option<String>,

    /// Run the browser headless
    #[serde(default = "default_true")]
    pub browser_headless: bool,

    /// Page navigation timeout in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Best-effort wait for the form-ready text pattern, in seconds
    #[serde(default = "default_form_wait_secs")]
    pub form_wait_secs: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            version: None,
            default_model: default_model(),
            generation_base_url: default_generation_base_url(),
            account_id: None,
            api_token: None,
            browser_executable: None,
            browser_headless: default_true(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            form_wait_secs: default_form_wait_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("gateway").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("AGENT_GATEWAY").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Identifier reported by GET /version
    pub fn version_string(&self) -> &str {
        self.version.as_deref().unwrap_or("local")
    }

    /// Page navigation timeout as Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Form-ready wait as Duration
    pub fn form_wait(&self) -> Duration {
        Duration::from_secs(self.form_wait_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_model() -> String {
    "@cf/meta/llama-3.3-70b-instruct-fp8-fast".to_string()
}

fn default_generation_base_url() -> String {
    "https://api.cloudflare.com/client/v4/accounts".to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_form_wait_secs() -> u64 {
    8
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8787);
        assert_eq!(cfg.default_model, "@cf/meta/llama-3.3-70b-instruct-fp8-fast");
        assert_eq!(cfg.navigation_timeout_secs, 30);
        assert_eq!(cfg.form_wait_secs, 8);
        assert!(cfg.browser_headless);
        assert!(cfg.enable_cors);
    }

    #[test]
    fn test_version_string_falls_back_to_local() {
        let mut cfg = ServerConfig::default();
        assert_eq!(cfg.version_string(), "local");
        cfg.version = Some("2026-08-23-abc123".to_string());
        assert_eq!(cfg.version_string(), "2026-08-23-abc123");
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8787);
    }
}
