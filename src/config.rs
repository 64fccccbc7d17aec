//! Configuration management for the Selly relay.
//!
//! Configuration is read from environment variables (a `.env` file in the
//! working directory is loaded first, if present):
//! - `PROJECT_ENDPOINT` - Required. Base URL of the hosted agents project.
//! - `MODEL_DEPLOYMENT_NAME` - Required. Model deployment used for provisioned agents.
//! - `ORCHESTRATOR_AGENT_ID` - Optional. Use a pre-provisioned orchestrator instead of
//!   creating the agent topology at startup.
//! - `AGENTS_API_TOKEN` - Optional. Bearer token sent with every agents API call.
//! - `AGENTS_API_VERSION` - Optional. Defaults to `2025-05-01`.
//! - `CRM_RESOURCE_FILE` - Optional. CRM document uploaded for file search.
//!   Defaults to `Resources/Database.pdf`.
//! - `FRONTEND_ORIGIN` - Optional. The only origin allowed by CORS.
//!   Defaults to `http://localhost:3000`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `RUN_POLL_INTERVAL_MS` - Optional. Run status poll interval. Defaults to `1000`.
//! - `RUN_TIMEOUT_SECS` - Optional. Upper bound on waiting for a run. Unbounded when unset.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_VERSION: &str = "2025-05-01";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_CRM_RESOURCE_FILE: &str = "Resources/Database.pdf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// How the orchestrator agent is obtained before the server accepts requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorSource {
    /// Create the CRM, web crawler, briefing and orchestrator agents at startup.
    Provision {
        /// Document uploaded into the CRM agent's vector store
        crm_resource_file: PathBuf,
    },
    /// Use an agent that was provisioned out of band.
    Existing { agent_id: String },
}

/// Polling behaviour while waiting for a run to reach a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolling {
    pub interval: Duration,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for RunPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            timeout: None,
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Agents project endpoint
    pub project_endpoint: String,

    /// Model deployment name for provisioned agents
    pub model_deployment: String,

    /// Optional bearer token for the agents API
    pub api_token: Option<String>,

    /// `api-version` query parameter sent with every call
    pub api_version: String,

    pub orchestrator: OrchestratorSource,

    /// Frontend origin allowed by CORS
    pub frontend_origin: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    pub run_polling: RunPolling,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `PROJECT_ENDPOINT` or
    /// `MODEL_DEPLOYMENT_NAME` is not set, and `ConfigError::InvalidValue`
    /// for numbers that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case in deployed environments.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let project_endpoint = required("PROJECT_ENDPOINT")?;
        let model_deployment = required("MODEL_DEPLOYMENT_NAME")?;

        let orchestrator = match var("ORCHESTRATOR_AGENT_ID") {
            Some(agent_id) => OrchestratorSource::Existing { agent_id },
            None => OrchestratorSource::Provision {
                crm_resource_file: var("CRM_RESOURCE_FILE")
                    .unwrap_or_else(|| DEFAULT_CRM_RESOURCE_FILE.to_string())
                    .into(),
            },
        };

        let port = var("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let interval_ms: u64 = var("RUN_POLL_INTERVAL_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("RUN_POLL_INTERVAL_MS".to_string(), format!("{}", e))
            })?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "RUN_POLL_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let timeout = var("RUN_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidValue("RUN_TIMEOUT_SECS".to_string(), format!("{}", e))
                })
            })
            .transpose()?;

        Ok(Self {
            project_endpoint,
            model_deployment,
            api_token: var("AGENTS_API_TOKEN"),
            api_version: var("AGENTS_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            orchestrator,
            frontend_origin: var("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string()),
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            run_polling: RunPolling {
                interval: Duration::from_millis(interval_ms),
                timeout,
            },
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(project_endpoint: String, model_deployment: String) -> Self {
        Self {
            project_endpoint,
            model_deployment,
            api_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            orchestrator: OrchestratorSource::Provision {
                crm_resource_file: DEFAULT_CRM_RESOURCE_FILE.into(),
            },
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            run_polling: RunPolling::default(),
        }
    }
}
