//! Client for the hosted agents service.
//!
//! The service owns agents, conversation threads, messages, runs, uploaded
//! files and vector stores. This module exposes the subset the relay needs
//! behind the [`AgentsClient`] trait so handlers can be exercised against a
//! stub.

mod client;
#[cfg(test)]
pub(crate) mod testing;
mod types;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::RunPolling;

pub use client::HttpAgentsClient;
pub use types::*;

/// Operations of the hosted agents API.
#[async_trait]
pub trait AgentsClient: Send + Sync {
    /// Open a new, empty conversation thread.
    async fn create_thread(&self) -> anyhow::Result<Thread>;

    /// Append a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> anyhow::Result<Message>;

    /// Start a run of `agent_id` over the thread.
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> anyhow::Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run>;

    /// List every message on the thread, following pagination to the end.
    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListSortOrder,
    ) -> anyhow::Result<Vec<Message>>;

    async fn upload_file(&self, path: &Path, purpose: FilePurpose) -> anyhow::Result<FileObject>;

    async fn get_file(&self, file_id: &str) -> anyhow::Result<FileObject>;

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> anyhow::Result<VectorStore>;

    async fn get_vector_store(&self, vector_store_id: &str) -> anyhow::Result<VectorStore>;

    async fn create_agent(&self, definition: &AgentDefinition) -> anyhow::Result<Agent>;

    /// Start a run and wait until it reaches a terminal status.
    ///
    /// No local tools are registered, so a run that asks for tool outputs is
    /// cancelled and then awaited like any other.
    async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        polling: RunPolling,
    ) -> anyhow::Result<Run> {
        let started = Instant::now();
        let mut run = self.create_run(thread_id, agent_id).await?;
        tracing::debug!(run_id = %run.id, status = ?run.status, "Run created");

        while !run.status.is_terminal() {
            if let Some(timeout) = polling.timeout {
                if started.elapsed() >= timeout {
                    anyhow::bail!(
                        "Run {} did not finish within {:?} (last status: {:?})",
                        run.id,
                        timeout,
                        run.status
                    );
                }
            }

            tokio::time::sleep(polling.interval).await;
            run = self.get_run(thread_id, &run.id).await?;

            if run.status == RunStatus::RequiresAction {
                tracing::warn!(
                    run_id = %run.id,
                    "Run requested tool outputs but no local tools are registered; cancelling"
                );
                run = self.cancel_run(thread_id, &run.id).await?;
            }
        }

        tracing::debug!(
            run_id = %run.id,
            status = ?run.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run finished"
        );
        Ok(run)
    }
}

pub type AgentsClientRef = Arc<dyn AgentsClient>;
