use std::sync::Arc;
use std::time::Duration;

use relay_core::config::PollingConfig;
use relay_core::{clean_reply, CheckOutcome, RunId, RunStatus, ThreadId, ToolCall};
use tokio::time::Instant;
use tracing::{error, info};

use crate::api::{ApiError, AssistantApi};
use crate::tools::ToolRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub deadline: Duration,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { deadline: Duration::from_secs(8), interval: Duration::from_secs(2) }
    }
}

impl From<&PollingConfig> for PollSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            deadline: Duration::from_secs(config.deadline_secs),
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Drives a run for at most `deadline`, executing requested tools along the way.
#[derive(Clone)]
pub struct RunPoller {
    api: Arc<dyn AssistantApi>,
    tools: Arc<ToolRegistry>,
    settings: PollSettings,
}

impl RunPoller {
    pub fn new(api: Arc<dyn AssistantApi>, tools: Arc<ToolRegistry>, settings: PollSettings) -> Self {
        Self { api, tools, settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    pub async fn check(&self, thread: &ThreadId, run: &RunId) -> Result<CheckOutcome, ApiError> {
        let started = Instant::now();

        while started.elapsed() < self.settings.deadline {
            let current = self.api.retrieve_run(thread, run).await?;
            info!(
                event_name = "agent.run.status",
                thread_id = %thread,
                run_id = %run,
                status = %current.status,
                "checking run status"
            );

            match current.status {
                RunStatus::Completed => {
                    let raw = self.api.latest_message_text(thread).await?.unwrap_or_default();
                    let reply = clean_reply(&raw);
                    info!(
                        event_name = "agent.run.completed",
                        thread_id = %thread,
                        run_id = %run,
                        reply_chars = reply.chars().count(),
                        "run completed"
                    );
                    return Ok(CheckOutcome::completed(reply));
                }
                RunStatus::RequiresAction => {
                    info!(
                        event_name = "agent.run.requires_action",
                        thread_id = %thread,
                        run_id = %run,
                        tool_calls = current.required_tool_calls.len(),
                        "run requires action"
                    );
                    self.submit_tool_outputs(thread, run, &current.required_tool_calls).await?;
                }
                ref status if status.is_terminal_failure() => {
                    error!(
                        event_name = "agent.run.failed",
                        thread_id = %thread,
                        run_id = %run,
                        status = %status,
                        "run failed"
                    );
                    return Ok(CheckOutcome::failed());
                }
                _ => {}
            }

            tokio::time::sleep(self.settings.interval).await;
        }

        info!(
            event_name = "agent.run.timeout",
            thread_id = %thread,
            run_id = %run,
            "run timed out"
        );
        Ok(CheckOutcome::timeout())
    }

    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        calls: &[ToolCall],
    ) -> Result<(), ApiError> {
        if calls.is_empty() {
            return Ok(());
        }

        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            outputs.push(self.tools.dispatch(call).await);
        }
        self.api.submit_tool_outputs(thread, run, outputs).await
    }
}
