//! `POST /generate_report` handler.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

use super::routes::AppState;
use super::types::{ErrorDetail, GenerateReportRequest, GenerateReportResponse};
use crate::relay::{self, RelayError, ReportOutcome};

/// Error returned to HTTP callers as `{ "detail": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorDetail { detail: self.detail })).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

/// Relay a company name to the orchestrator and return its final answer.
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateReportRequest>, JsonRejection>,
) -> Result<Json<GenerateReportResponse>, ApiError> {
    let Json(req) = payload?;

    let span = tracing::info_span!("generate_report", request_id = %Uuid::new_v4());
    async move {
        tracing::info!(company_name = %req.company_name, "Report requested");

        let outcome = relay::generate_report(
            state.client.as_ref(),
            state.orchestrator.as_ref(),
            state.config.run_polling,
            &req.company_name,
        )
        .await
        .map_err(|e| {
            tracing::error!("Report generation failed: {}", e);
            ApiError::from(e)
        })?;

        let body = match outcome {
            ReportOutcome::Response(response) => {
                tracing::info!(chars = response.len(), "Report generated");
                GenerateReportResponse::Response { response }
            }
            ReportOutcome::RunFailed(error) => GenerateReportResponse::Error { error },
        };
        Ok::<_, ApiError>(Json(body))
    }
    .instrument(span)
    .await
}
