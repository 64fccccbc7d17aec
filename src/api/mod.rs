//! HTTP API for the Selly relay.
//!
//! ## Endpoints
//!
//! - `POST /generate_report` - Relay a company name to the orchestrator agent
//! - `GET /health` - Health check

mod report;
mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
