//! Orchestrator agent resolution.
//!
//! The relay needs exactly one orchestrator agent before it serves requests.
//! Either it provisions the whole Selly topology on the agents service
//!
//! ```text
//!   SellyOrchestrator
//!     ├── SellyCRM         (file search over the CRM document)
//!     ├── SellyWebCrawler
//!     └── SellyBriefing
//! ```
//!
//! or it uses an orchestrator id provisioned out of band.

use std::path::Path;

use anyhow::Context;
use tokio::time::Instant;

use crate::agents::{
    AgentDefinition, AgentsClient, ConnectedAgent, FileObject, FilePurpose, FileSearchResources,
    ToolDefinition, ToolResources, VectorStoreStatus,
};
use crate::config::{Config, OrchestratorSource};

pub const CRM_AGENT_NAME: &str = "SellyCRM";
pub const WEB_CRAWLER_AGENT_NAME: &str = "SellyWebCrawler";
pub const BRIEFING_AGENT_NAME: &str = "SellyBriefing";
pub const ORCHESTRATOR_AGENT_NAME: &str = "SellyOrchestrator";

pub const CRM_VECTOR_STORE_NAME: &str = "crm_vector_store";

const CRM_INSTRUCTIONS: &str = include_str!("prompts/crm.md");
const WEB_CRAWLER_INSTRUCTIONS: &str = include_str!("prompts/web_crawler.md");
const BRIEFING_INSTRUCTIONS: &str = include_str!("prompts/briefing.md");
const ORCHESTRATOR_INSTRUCTIONS: &str = include_str!("prompts/orchestrator.md");

/// The agent every report request runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orchestrator {
    pub id: String,
    pub name: Option<String>,
}

/// Resolve the orchestrator according to `config.orchestrator`.
pub async fn resolve_orchestrator(
    client: &dyn AgentsClient,
    config: &Config,
) -> anyhow::Result<Orchestrator> {
    match &config.orchestrator {
        OrchestratorSource::Existing { agent_id } => {
            tracing::info!(agent_id = %agent_id, "Using pre-provisioned orchestrator agent");
            Ok(Orchestrator {
                id: agent_id.clone(),
                name: None,
            })
        }
        OrchestratorSource::Provision { crm_resource_file } => {
            provision_topology(client, config, crm_resource_file).await
        }
    }
}

/// Upload the CRM document, create the sub-agents and wire them into a new
/// orchestrator as connected agent tools.
///
/// Waiting on the file and the vector store shares `RUN_TIMEOUT_SECS`.
pub async fn provision_topology(
    client: &dyn AgentsClient,
    config: &Config,
    crm_resource_file: &Path,
) -> anyhow::Result<Orchestrator> {
    let model = config.model_deployment.as_str();
    let deadline = config.run_polling.timeout.map(|t| Instant::now() + t);

    let file = client
        .upload_file(crm_resource_file, FilePurpose::Agents)
        .await
        .with_context(|| format!("Failed to upload {}", crm_resource_file.display()))?;
    let file = wait_for_file(client, config, deadline, file).await?;
    tracing::info!(
        file_id = %file.id,
        filename = file.filename.as_deref().unwrap_or("-"),
        "Uploaded CRM resource file"
    );

    let vector_store_id = create_vector_store_and_wait(client, config, deadline, &file.id).await?;
    tracing::info!(vector_store_id = %vector_store_id, "CRM vector store ready");

    let crm = client
        .create_agent(&AgentDefinition {
            model: model.to_string(),
            name: CRM_AGENT_NAME.to_string(),
            instructions: CRM_INSTRUCTIONS.to_string(),
            tools: vec![ToolDefinition::FileSearch],
            tool_resources: Some(ToolResources {
                file_search: Some(FileSearchResources {
                    vector_store_ids: vec![vector_store_id],
                }),
            }),
        })
        .await
        .context("Failed to create CRM agent")?;

    let web_crawler = client
        .create_agent(&plain_agent(model, WEB_CRAWLER_AGENT_NAME, WEB_CRAWLER_INSTRUCTIONS))
        .await
        .context("Failed to create web crawler agent")?;

    let briefing = client
        .create_agent(&plain_agent(model, BRIEFING_AGENT_NAME, BRIEFING_INSTRUCTIONS))
        .await
        .context("Failed to create briefing agent")?;

    let connected = [
        (crm.id, CRM_AGENT_NAME, "Checks the company's records in the CRM system."),
        (
            web_crawler.id,
            WEB_CRAWLER_AGENT_NAME,
            "Searches the web for relevant information.",
        ),
        (
            briefing.id,
            BRIEFING_AGENT_NAME,
            "Writes a briefing from the web crawler's findings.",
        ),
    ];
    let tools = connected
        .into_iter()
        .map(|(id, name, description)| ToolDefinition::ConnectedAgent {
            connected_agent: ConnectedAgent {
                id,
                name: name.to_string(),
                description: description.to_string(),
            },
        })
        .collect();

    let orchestrator = client
        .create_agent(&AgentDefinition {
            model: model.to_string(),
            name: ORCHESTRATOR_AGENT_NAME.to_string(),
            instructions: ORCHESTRATOR_INSTRUCTIONS.to_string(),
            tools,
            tool_resources: None,
        })
        .await
        .context("Failed to create orchestrator agent")?;

    tracing::info!(agent_id = %orchestrator.id, "Provisioned orchestrator agent");
    Ok(Orchestrator {
        id: orchestrator.id,
        name: orchestrator.name,
    })
}

fn plain_agent(model: &str, name: &str, instructions: &str) -> AgentDefinition {
    AgentDefinition {
        model: model.to_string(),
        name: name.to_string(),
        instructions: instructions.to_string(),
        tools: Vec::new(),
        tool_resources: None,
    }
}

fn check_deadline(deadline: Option<Instant>, what: &str) -> anyhow::Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            anyhow::bail!("Timed out waiting for {}", what)
        }
        _ => Ok(()),
    }
}

/// Poll an uploaded file until the service has processed it.
async fn wait_for_file(
    client: &dyn AgentsClient,
    config: &Config,
    deadline: Option<Instant>,
    mut file: FileObject,
) -> anyhow::Result<FileObject> {
    loop {
        match file.status.clone() {
            None => return Ok(file),
            Some(status) if status.is_ready() => return Ok(file),
            Some(status) if status.is_failed() => {
                anyhow::bail!("File {} ended in status {:?}", file.id, status);
            }
            Some(_) => {
                check_deadline(deadline, &format!("file {}", file.id))?;
                tokio::time::sleep(config.run_polling.interval).await;
                let filename = file.filename.take();
                file = client.get_file(&file.id).await?;
                if file.filename.is_none() {
                    file.filename = filename;
                }
            }
        }
    }
}

async fn create_vector_store_and_wait(
    client: &dyn AgentsClient,
    config: &Config,
    deadline: Option<Instant>,
    file_id: &str,
) -> anyhow::Result<String> {
    let mut store = client
        .create_vector_store(CRM_VECTOR_STORE_NAME, &[file_id.to_string()])
        .await
        .context("Failed to create CRM vector store")?;

    loop {
        match store.status {
            VectorStoreStatus::Completed => return Ok(store.id),
            VectorStoreStatus::Failed | VectorStoreStatus::Expired => {
                anyhow::bail!(
                    "Vector store {} ended in status {:?}",
                    store.id,
                    store.status
                );
            }
            VectorStoreStatus::InProgress | VectorStoreStatus::Unknown => {
                check_deadline(deadline, &format!("vector store {}", store.id))?;
                tokio::time::sleep(config.run_polling.interval).await;
                store = client.get_vector_store(&store.id).await?;
            }
        }
    }
}
