//! Selly relay - HTTP Server Entry Point
//!
//! Resolves the orchestrator agent and starts the HTTP server.

use selly_relay::{api, config::Config, config::OrchestratorSource};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "selly_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let mode = match &config.orchestrator {
        OrchestratorSource::Existing { .. } => "existing agent",
        OrchestratorSource::Provision { .. } => "provision at startup",
    };
    info!(
        "Loaded configuration: endpoint={}, model={}, orchestrator={}",
        config.project_endpoint, config.model_deployment, mode
    );

    api::serve(config).await?;

    Ok(())
}
