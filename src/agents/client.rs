//! `reqwest` implementation of [`AgentsClient`].

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{
    Agent, AgentDefinition, AgentsClient, FileObject, FilePurpose, ListPage, ListSortOrder,
    Message, MessageRole, Run, Thread, VectorStore,
};

/// Page size requested when listing messages.
const LIST_PAGE_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct HttpAgentsClient {
    base_url: String,
    api_version: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HttpAgentsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_version: api_version.into(),
            api_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .query(&[("api-version", self.api_version.as_str())]);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body, failing on non-2xx statuses.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> anyhow::Result<T> {
        let resp = builder
            .send()
            .await
            .with_context(|| format!("Failed to call agents API {}", what))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Agents API {} failed: {} - {}", what, status, text);
        }

        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse agents API {} response: {}", what, text))
    }
}

#[async_trait]
impl AgentsClient for HttpAgentsClient {
    async fn create_thread(&self) -> anyhow::Result<Thread> {
        let builder = self
            .request(reqwest::Method::POST, "/threads")
            .json(&json!({}));
        self.send(builder, "POST /threads").await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> anyhow::Result<Message> {
        let builder = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{}/messages", thread_id),
            )
            .json(&json!({ "role": role, "content": content }));
        self.send(builder, "POST /threads/{id}/messages").await
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> anyhow::Result<Run> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&json!({ "assistant_id": agent_id }));
        self.send(builder, "POST /threads/{id}/runs").await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run> {
        let builder = self.request(
            reqwest::Method::GET,
            &format!("/threads/{}/runs/{}", thread_id, run_id),
        );
        self.send(builder, "GET /threads/{id}/runs/{id}").await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run> {
        let builder = self.request(
            reqwest::Method::POST,
            &format!("/threads/{}/runs/{}/cancel", thread_id, run_id),
        );
        self.send(builder, "POST /threads/{id}/runs/{id}/cancel")
            .await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListSortOrder,
    ) -> anyhow::Result<Vec<Message>> {
        let path = format!("/threads/{}/messages", thread_id);
        let limit = LIST_PAGE_LIMIT.to_string();
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("order", order.as_str()), ("limit", limit.as_str())];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }
            let builder = self.request(reqwest::Method::GET, &path).query(&query);
            let page: ListPage<Message> = self.send(builder, "GET /threads/{id}/messages").await?;

            messages.extend(page.data);
            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn upload_file(&self, path: &Path, purpose: FilePurpose) -> anyhow::Result<FileObject> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.as_str())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );
        let builder = self.request(reqwest::Method::POST, "/files").multipart(form);
        self.send(builder, "POST /files").await
    }

    async fn get_file(&self, file_id: &str) -> anyhow::Result<FileObject> {
        let builder = self.request(reqwest::Method::GET, &format!("/files/{}", file_id));
        self.send(builder, "GET /files/{id}").await
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> anyhow::Result<VectorStore> {
        let builder = self
            .request(reqwest::Method::POST, "/vector_stores")
            .json(&json!({ "name": name, "file_ids": file_ids }));
        self.send(builder, "POST /vector_stores").await
    }

    async fn get_vector_store(&self, vector_store_id: &str) -> anyhow::Result<VectorStore> {
        let builder = self.request(
            reqwest::Method::GET,
            &format!("/vector_stores/{}", vector_store_id),
        );
        self.send(builder, "GET /vector_stores/{id}").await
    }

    async fn create_agent(&self, definition: &AgentDefinition) -> anyhow::Result<Agent> {
        let builder = self
            .request(reqwest::Method::POST, "/assistants")
            .json(definition);
        self.send(builder, "POST /assistants").await
    }
}
