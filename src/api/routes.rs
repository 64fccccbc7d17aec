//! HTTP route handlers.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::HeaderValue,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agents::{AgentsClientRef, HttpAgentsClient};
use crate::config::Config;
use crate::provision::{self, Orchestrator};

use super::report;
use super::types::*;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Agents service client
    pub client: AgentsClientRef,
    /// Resolved once before the listener starts; `None` if that failed
    pub orchestrator: Option<Orchestrator>,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let client: AgentsClientRef = Arc::new(HttpAgentsClient::new(
        config.project_endpoint.clone(),
        config.api_version.clone(),
        config.api_token.clone(),
    ));

    let orchestrator = match provision::resolve_orchestrator(client.as_ref(), &config).await {
        Ok(orchestrator) => {
            tracing::info!(
                agent_id = %orchestrator.id,
                name = orchestrator.name.as_deref().unwrap_or("(pre-provisioned)"),
                "Orchestrator agent ready"
            );
            Some(orchestrator)
        }
        Err(e) => {
            tracing::error!(
                "Failed to initialize orchestrator agent: {:#}. Report requests will fail.",
                e
            );
            None
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        client,
        orchestrator,
    });
    let app = router(state)?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.frontend_origin)?;

    Ok(Router::new()
        .route("/health", get(health))
        .route("/generate_report", post(report::generate_report))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Allow the configured frontend origin only, with any method or header.
///
/// Requests from any other origin get no `Access-Control-Allow-Origin`.
fn cors_layer(frontend_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_origin)
        .with_context(|| format!("Invalid FRONTEND_ORIGIN: {}", frontend_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Wait for SIGTERM/SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        orchestrator_ready: state.orchestrator.is_some(),
    })
}
