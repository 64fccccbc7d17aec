//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to generate a company report.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReportRequest {
    /// Company to brief on, forwarded to the orchestrator verbatim
    pub company_name: String,
}

/// Body of a `200` report response.
///
/// A failed orchestrator run is still a `200`; callers tell the cases apart
/// by which field is present.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GenerateReportResponse {
    /// Final orchestrator text
    Response { response: String },

    /// The run's `last_error`, as reported by the agents service
    Error { error: serde_json::Value },
}

/// Body of every non-`200` response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether an orchestrator agent was resolved at startup
    pub orchestrator_ready: bool,
}
