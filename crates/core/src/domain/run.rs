use serde::{Deserialize, Serialize};

use crate::domain::{RunId, ThreadId, ToolCallId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    Unknown(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "requires_action" => Self::RequiresAction,
            "cancelling" => Self::Cancelling,
            "cancelled" => Self::Cancelled,
            "failed" => Self::Failed,
            "completed" => Self::Completed,
            "incomplete" => Self::Incomplete,
            "expired" => Self::Expired,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown(raw) => raw,
        }
    }

    /// Statuses from which the run will never produce a reply.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCall {
    pub id: ToolCallId,
    pub name: String,
    /// Raw JSON text as produced by the model; may be malformed.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: ToolCallId,
    pub output: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    pub status: RunStatus,
    pub required_tool_calls: Vec<ToolCall>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Completed,
    Failed,
    Timeout,
}

/// Result of a bounded `/check` poll, serialized verbatim to the front-end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub response: String,
    pub status: CheckStatus,
}

impl CheckOutcome {
    pub fn completed(response: impl Into<String>) -> Self {
        Self { response: response.into(), status: CheckStatus::Completed }
    }

    pub fn failed() -> Self {
        Self { response: "error".to_string(), status: CheckStatus::Failed }
    }

    pub fn timeout() -> Self {
        Self { response: "timeout".to_string(), status: CheckStatus::Timeout }
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckOutcome, RunStatus};

    #[test]
    fn known_statuses_parse_and_render() {
        for raw in [
            "queued",
            "in_progress",
            "requires_action",
            "cancelling",
            "cancelled",
            "failed",
            "completed",
            "incomplete",
            "expired",
        ] {
            let status = RunStatus::parse(raw);
            assert!(!matches!(status, RunStatus::Unknown(_)), "{raw} should be known");
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status = RunStatus::parse("paused");
        assert_eq!(status, RunStatus::Unknown("paused".to_string()));
        assert!(!status.is_terminal_failure());
    }

    #[test]
    fn terminal_failures_are_classified() {
        assert!(RunStatus::Failed.is_terminal_failure());
        assert!(RunStatus::Expired.is_terminal_failure());
        assert!(RunStatus::Cancelled.is_terminal_failure());
        assert!(RunStatus::Incomplete.is_terminal_failure());
        assert!(!RunStatus::Completed.is_terminal_failure());
        assert!(!RunStatus::RequiresAction.is_terminal_failure());
    }

    #[test]
    fn outcomes_serialize_in_front_end_shape() {
        let failed = serde_json::to_value(CheckOutcome::failed()).expect("serialize");
        assert_eq!(failed, serde_json::json!({"response": "error", "status": "failed"}));

        let timeout = serde_json::to_value(CheckOutcome::timeout()).expect("serialize");
        assert_eq!(timeout, serde_json::json!({"response": "timeout", "status": "timeout"}));
    }
}
