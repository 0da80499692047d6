use async_trait::async_trait;
use relay_core::{
    ApplicationError, AssistantId, DomainError, Run, RunId, ThreadId, ToolOutput,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("assistant api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("assistant api returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("assistant api response could not be decoded: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<ApiError> for ApplicationError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Domain(error) => ApplicationError::Domain(error),
            other => ApplicationError::Upstream(other.to_string()),
        }
    }
}

/// Everything needed to create a new assistant.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    /// Tool entries in wire form (`{"type": "function", ...}`, `{"type": "file_search"}`).
    pub tools: Vec<Value>,
    pub file_ids: Vec<String>,
}

#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_thread(&self) -> Result<ThreadId, ApiError>;

    async fn add_user_message(&self, thread: &ThreadId, content: &str) -> Result<(), ApiError>;

    async fn create_run(&self, thread: &ThreadId, assistant: &AssistantId)
        -> Result<RunId, ApiError>;

    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run, ApiError>;

    /// Text of the newest message on the thread, if it has a text part.
    async fn latest_message_text(&self, thread: &ThreadId) -> Result<Option<String>, ApiError>;

    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> Result<(), ApiError>;

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError>;

    async fn create_assistant(&self, spec: AssistantSpec) -> Result<AssistantId, ApiError>;
}
