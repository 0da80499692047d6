pub mod config;
pub mod domain;
pub mod errors;
pub mod text;

pub use domain::run::{CheckOutcome, CheckStatus, Run, RunStatus, ToolCall, ToolOutput};
pub use domain::thread::{ThreadRecord, DEFAULT_PLATFORM};
pub use domain::{AssistantId, RunId, ThreadId, ToolCallId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use text::clean_reply;
