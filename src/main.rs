//! Agent Gateway - HTTP front door for generation and browser bindings
//!
//! This binary loads configuration from the environment and serves the
//! gateway routes until shutdown.

use agent_gateway::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present, then configuration
    dotenvy::dotenv().ok();
    let config = ServerConfig::load()?;

    // Start server
    agent_gateway::start_server(config).await?;

    Ok(())
}
