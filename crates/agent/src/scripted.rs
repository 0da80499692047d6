//! In-process `AssistantApi` that replays scripted run states. Used by tests
//! across the workspace.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use relay_core::{AssistantId, Run, RunId, RunStatus, ThreadId, ToolCall, ToolOutput};

use crate::api::{ApiError, AssistantApi, AssistantSpec};

#[derive(Default)]
struct ScriptState {
    thread_count: usize,
    run_count: usize,
    file_count: usize,
    script: VecDeque<(RunStatus, Vec<ToolCall>)>,
    last: Option<(RunStatus, Vec<ToolCall>)>,
    reply: Option<String>,
    failure: Option<u16>,
    retrieve_calls: usize,
    messages: Vec<(ThreadId, String)>,
    runs: Vec<(ThreadId, AssistantId)>,
    submitted: Vec<Vec<ToolOutput>>,
    uploads: Vec<String>,
    assistants: Vec<AssistantSpec>,
}

#[derive(Default)]
pub struct ScriptedAssistantApi {
    state: Mutex<ScriptState>,
}

impl ScriptedAssistantApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues the status returned by the next `retrieve_run`. Once the queue
    /// drains the last status repeats; with nothing queued runs stay in progress.
    pub fn then_status(self, status: RunStatus) -> Self {
        self.state().script.push_back((status, Vec::new()));
        self
    }

    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.state().script.push_back((RunStatus::RequiresAction, calls));
        self
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.state().reply = Some(reply.into());
        self
    }

    /// Every call fails with the given HTTP status.
    pub fn failing_with(self, status: u16) -> Self {
        self.state().failure = Some(status);
        self
    }

    pub fn retrieve_calls(&self) -> usize {
        self.state().retrieve_calls
    }

    pub fn messages(&self) -> Vec<(ThreadId, String)> {
        self.state().messages.clone()
    }

    pub fn started_runs(&self) -> Vec<(ThreadId, AssistantId)> {
        self.state().runs.clone()
    }

    pub fn submitted(&self) -> Vec<Vec<ToolOutput>> {
        self.state().submitted.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    pub fn created_assistants(&self) -> Vec<AssistantSpec> {
        self.state().assistants.clone()
    }

    fn check_failure(&self) -> Result<(), ApiError> {
        match self.state().failure {
            Some(status) => {
                Err(ApiError::Status { status, body: "scripted failure".to_string() })
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssistantApi for ScriptedAssistantApi {
    async fn create_thread(&self) -> Result<ThreadId, ApiError> {
        self.check_failure()?;
        let mut state = self.state();
        state.thread_count += 1;
        Ok(ThreadId(format!("thread_{:03}", state.thread_count)))
    }

    async fn add_user_message(&self, thread: &ThreadId, content: &str) -> Result<(), ApiError> {
        self.check_failure()?;
        self.state().messages.push((thread.clone(), content.to_string()));
        Ok(())
    }

    async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<RunId, ApiError> {
        self.check_failure()?;
        let mut state = self.state();
        state.run_count += 1;
        state.runs.push((thread.clone(), assistant.clone()));
        Ok(RunId(format!("run_{:03}", state.run_count)))
    }

    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run, ApiError> {
        self.check_failure()?;
        let mut state = self.state();
        state.retrieve_calls += 1;

        let (status, calls) = match state.script.pop_front() {
            Some(step) => {
                state.last = Some(step.clone());
                step
            }
            None => state.last.clone().unwrap_or((RunStatus::InProgress, Vec::new())),
        };

        Ok(Run {
            id: run.clone(),
            thread_id: thread.clone(),
            status,
            required_tool_calls: calls,
        })
    }

    async fn latest_message_text(&self, _thread: &ThreadId) -> Result<Option<String>, ApiError> {
        self.check_failure()?;
        Ok(self.state().reply.clone())
    }

    async fn submit_tool_outputs(
        &self,
        _thread: &ThreadId,
        _run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> Result<(), ApiError> {
        self.check_failure()?;
        self.state().submitted.push(outputs);
        Ok(())
    }

    async fn upload_file(&self, file_name: &str, _bytes: Vec<u8>) -> Result<String, ApiError> {
        self.check_failure()?;
        let mut state = self.state();
        state.file_count += 1;
        state.uploads.push(file_name.to_string());
        Ok(format!("file_{:03}", state.file_count))
    }

    async fn create_assistant(&self, spec: AssistantSpec) -> Result<AssistantId, ApiError> {
        self.check_failure()?;
        let mut state = self.state();
        state.assistants.push(spec);
        Ok(AssistantId(format!("asst_{:03}", state.assistants.len())))
    }
}
