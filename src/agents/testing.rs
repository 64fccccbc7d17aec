//! In-memory [`AgentsClient`] used by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;

/// Operation a stub can be told to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOp {
    CreateThread,
    CreateMessage,
    CreateRun,
    GetRun,
    ListMessages,
    UploadFile,
    CreateVectorStore,
    CreateAgent,
}

/// Call counters per operation.
#[derive(Debug, Clone, Default)]
pub struct StubCalls {
    pub create_thread: usize,
    pub create_message: usize,
    pub create_run: usize,
    pub get_run: usize,
    pub cancel_run: usize,
    pub list_messages: usize,
    pub upload_file: usize,
    pub get_file: usize,
    pub create_vector_store: usize,
    pub get_vector_store: usize,
    pub create_agent: usize,
}

#[derive(Default)]
struct StubState {
    calls: StubCalls,
    threads: HashMap<String, Vec<Message>>,
    run_cursor: usize,
    vector_store_cursor: usize,
    file_cursor: usize,
    agents: Vec<AgentDefinition>,
    posted: Vec<(String, MessageRole, String)>,
}

/// Scripted agents service.
///
/// Runs walk through `run_statuses` (sticking on the last entry) and every
/// listed thread holds the posted messages followed by the scripted replies.
pub struct StubAgentsClient {
    state: Mutex<StubState>,
    run_statuses: Vec<RunStatus>,
    last_error: serde_json::Value,
    replies: Vec<(MessageRole, Vec<String>)>,
    echo_reply: bool,
    vector_store_statuses: Vec<VectorStoreStatus>,
    file_statuses: Vec<Option<FileStatus>>,
    fail_on: Option<StubOp>,
}

impl StubAgentsClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StubState::default()),
            run_statuses: vec![RunStatus::Completed],
            last_error: serde_json::Value::Null,
            replies: Vec::new(),
            echo_reply: false,
            vector_store_statuses: vec![VectorStoreStatus::Completed],
            file_statuses: vec![Some(FileStatus::Processed)],
            fail_on: None,
        }
    }

    pub fn with_run_statuses(mut self, statuses: Vec<RunStatus>) -> Self {
        assert!(!statuses.is_empty());
        self.run_statuses = statuses;
        self
    }

    pub fn with_last_error(mut self, last_error: serde_json::Value) -> Self {
        self.last_error = last_error;
        self
    }

    /// Append a message that appears on every thread after the posted ones.
    pub fn with_reply(mut self, role: MessageRole, texts: &[&str]) -> Self {
        self.replies
            .push((role, texts.iter().map(|t| t.to_string()).collect()));
        self
    }

    /// Answer every posted user message with `Report for <content>`.
    pub fn with_echo_reply(mut self) -> Self {
        self.echo_reply = true;
        self
    }

    pub fn with_vector_store_statuses(mut self, statuses: Vec<VectorStoreStatus>) -> Self {
        assert!(!statuses.is_empty());
        self.vector_store_statuses = statuses;
        self
    }

    /// Statuses reported for the uploaded file; `None` omits the field.
    pub fn with_file_statuses(mut self, statuses: Vec<Option<FileStatus>>) -> Self {
        assert!(!statuses.is_empty());
        self.file_statuses = statuses;
        self
    }

    pub fn failing_on(mut self, op: StubOp) -> Self {
        self.fail_on = Some(op);
        self
    }

    pub fn calls(&self) -> StubCalls {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn created_agents(&self) -> Vec<AgentDefinition> {
        self.state.lock().unwrap().agents.clone()
    }

    /// `(thread_id, role, content)` of every posted message.
    pub fn posted_messages(&self) -> Vec<(String, MessageRole, String)> {
        self.state.lock().unwrap().posted.clone()
    }

    fn check(&self, op: StubOp) -> anyhow::Result<()> {
        if self.fail_on == Some(op) {
            anyhow::bail!("stub failure during {:?}", op);
        }
        Ok(())
    }

    fn run_at(&self, cursor: usize, thread_id: &str, run_id: &str) -> Run {
        let index = cursor.min(self.run_statuses.len() - 1);
        let status = self.run_statuses[index].clone();
        let last_error = if status == RunStatus::Failed {
            self.last_error.clone()
        } else {
            serde_json::Value::Null
        };
        Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            last_error,
        }
    }

    fn text_message(id: String, role: MessageRole, texts: &[String]) -> Message {
        Message {
            id,
            role,
            content: texts
                .iter()
                .map(|value| MessageContent::Text {
                    text: MessageText {
                        value: value.clone(),
                    },
                })
                .collect(),
        }
    }
}

#[async_trait]
impl AgentsClient for StubAgentsClient {
    async fn create_thread(&self) -> anyhow::Result<Thread> {
        self.check(StubOp::CreateThread)?;
        let mut state = self.state.lock().unwrap();
        state.calls.create_thread += 1;
        let id = format!("thread_{}", state.calls.create_thread);
        state.threads.insert(id.clone(), Vec::new());
        Ok(Thread { id })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> anyhow::Result<Message> {
        self.check(StubOp::CreateMessage)?;
        let mut state = self.state.lock().unwrap();
        state.calls.create_message += 1;
        let id = format!("msg_{}", state.calls.create_message);
        let message = Self::text_message(id, role, &[content.to_string()]);
        state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| anyhow::anyhow!("unknown thread {}", thread_id))?
            .push(message.clone());
        state
            .posted
            .push((thread_id.to_string(), role, content.to_string()));
        Ok(message)
    }

    async fn create_run(&self, thread_id: &str, _agent_id: &str) -> anyhow::Result<Run> {
        self.check(StubOp::CreateRun)?;
        let mut state = self.state.lock().unwrap();
        state.calls.create_run += 1;
        state.run_cursor = 0;
        let run_id = format!("run_{}", state.calls.create_run);
        Ok(self.run_at(0, thread_id, &run_id))
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run> {
        self.check(StubOp::GetRun)?;
        let mut state = self.state.lock().unwrap();
        state.calls.get_run += 1;
        state.run_cursor += 1;
        Ok(self.run_at(state.run_cursor, thread_id, run_id))
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> anyhow::Result<Run> {
        let mut state = self.state.lock().unwrap();
        state.calls.cancel_run += 1;
        state.run_cursor += 1;
        Ok(self.run_at(state.run_cursor, thread_id, run_id))
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListSortOrder,
    ) -> anyhow::Result<Vec<Message>> {
        self.check(StubOp::ListMessages)?;
        let mut state = self.state.lock().unwrap();
        state.calls.list_messages += 1;

        let posted = state
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown thread {}", thread_id))?;

        let mut messages = Vec::new();
        for message in posted {
            let echo = (self.echo_reply && message.role == MessageRole::User).then(|| {
                let texts: Vec<String> = message
                    .text_segments()
                    .map(|text| format!("Report for {}", text))
                    .collect();
                Self::text_message(format!("{}_reply", message.id), MessageRole::Assistant, &texts)
            });
            messages.push(message);
            messages.extend(echo);
        }
        for (i, (role, texts)) in self.replies.iter().enumerate() {
            messages.push(Self::text_message(format!("reply_{}", i), *role, texts));
        }

        if order == ListSortOrder::Descending {
            messages.reverse();
        }
        Ok(messages)
    }

    async fn upload_file(&self, path: &Path, _purpose: FilePurpose) -> anyhow::Result<FileObject> {
        self.check(StubOp::UploadFile)?;
        let mut state = self.state.lock().unwrap();
        state.calls.upload_file += 1;
        state.file_cursor = 0;
        Ok(FileObject {
            id: format!("file_{}", state.calls.upload_file),
            filename: path.file_name().map(|n| n.to_string_lossy().to_string()),
            status: self.file_statuses[0].clone(),
        })
    }

    async fn get_file(&self, file_id: &str) -> anyhow::Result<FileObject> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_file += 1;
        state.file_cursor += 1;
        let index = state.file_cursor.min(self.file_statuses.len() - 1);
        Ok(FileObject {
            id: file_id.to_string(),
            filename: None,
            status: self.file_statuses[index].clone(),
        })
    }

    async fn create_vector_store(
        &self,
        _name: &str,
        _file_ids: &[String],
    ) -> anyhow::Result<VectorStore> {
        self.check(StubOp::CreateVectorStore)?;
        let mut state = self.state.lock().unwrap();
        state.calls.create_vector_store += 1;
        state.vector_store_cursor = 0;
        Ok(VectorStore {
            id: format!("vs_{}", state.calls.create_vector_store),
            status: self.vector_store_statuses[0].clone(),
        })
    }

    async fn get_vector_store(&self, vector_store_id: &str) -> anyhow::Result<VectorStore> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_vector_store += 1;
        state.vector_store_cursor += 1;
        let index = state
            .vector_store_cursor
            .min(self.vector_store_statuses.len() - 1);
        Ok(VectorStore {
            id: vector_store_id.to_string(),
            status: self.vector_store_statuses[index].clone(),
        })
    }

    async fn create_agent(&self, definition: &AgentDefinition) -> anyhow::Result<Agent> {
        self.check(StubOp::CreateAgent)?;
        let mut state = self.state.lock().unwrap();
        state.calls.create_agent += 1;
        state.agents.push(definition.clone());
        Ok(Agent {
            id: format!("asst_{}", definition.name.to_lowercase()),
            name: Some(definition.name.clone()),
        })
    }
}
