//! Assistant runtime: everything between an incoming chat message and the
//! hosted assistant that answers it.
//!
//! - `api` / `openai` - the thread, message, run and file operations of an
//!   Assistants-style API, and the HTTP client that implements them
//! - `tools` - the `Tool` trait and the registry that dispatches tool calls
//! - `builtin` - tools shipped with the service (current time, human handoff)
//! - `runs` - the bounded poll that drives a run to a reply
//! - `assistant` - resolving or provisioning the assistant a run executes against
//!
//! The assistant decides *which* tool to call; the registry decides whether
//! that tool exists and what its output looks like on the wire.

pub mod api;
pub mod assistant;
pub mod builtin;
pub mod openai;
pub mod runs;
pub mod scripted;
pub mod tools;

pub use api::{ApiError, AssistantApi, AssistantSpec};
pub use openai::OpenAiClient;
pub use runs::{PollSettings, RunPoller};
pub use tools::{Tool, ToolDefinition, ToolError, ToolRegistry};
