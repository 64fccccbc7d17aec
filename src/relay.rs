//! Report generation: one company name in, one orchestrator answer out.

use thiserror::Error;

use crate::agents::{AgentsClient, ListSortOrder, Message, MessageRole, RunStatus};
use crate::config::RunPolling;
use crate::provision::Orchestrator;

/// Returned when the run completed but the orchestrator never answered.
pub const NO_ASSISTANT_RESPONSE: &str = "No assistant response.";

/// Result of a relay that reached the agents service and got a verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Final text of the orchestrator.
    Response(String),
    /// The run failed; carries the run's `last_error` untouched.
    RunFailed(serde_json::Value),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Orchestrator agent not initialized.")]
    NotInitialized,

    #[error("{0:#}")]
    Remote(#[from] anyhow::Error),
}

/// Relay `company_name` to the orchestrator on a fresh thread and wait for
/// the answer.
pub async fn generate_report(
    client: &dyn AgentsClient,
    orchestrator: Option<&Orchestrator>,
    polling: RunPolling,
    company_name: &str,
) -> Result<ReportOutcome, RelayError> {
    let orchestrator = orchestrator.ok_or(RelayError::NotInitialized)?;

    let thread = client.create_thread().await?;
    tracing::debug!(thread_id = %thread.id, "Thread created");

    client
        .create_message(&thread.id, MessageRole::User, company_name)
        .await?;

    let run = client
        .create_and_process_run(&thread.id, &orchestrator.id, polling)
        .await?;

    if run.status == RunStatus::Failed {
        tracing::warn!(
            thread_id = %thread.id,
            run_id = %run.id,
            last_error = %run.last_error,
            "Orchestrator run failed"
        );
        return Ok(ReportOutcome::RunFailed(run.last_error));
    }

    let messages = client
        .list_messages(&thread.id, ListSortOrder::Ascending)
        .await?;

    let response = last_assistant_text(&messages)
        .unwrap_or(NO_ASSISTANT_RESPONSE)
        .to_string();
    Ok(ReportOutcome::Response(response))
}

/// Last text segment of the latest assistant message that has any text.
/// `messages` must be in ascending chronological order.
pub fn last_assistant_text(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::Assistant)
        .find_map(|m| m.text_segments().last())
}
