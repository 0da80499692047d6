pub mod current_time;
pub mod human_assistance;

use std::sync::Arc;

use relay_core::config::AppConfig;
use relay_db::ThreadLog;
use reqwest::Client;

pub use current_time::CurrentTimeTool;
pub use human_assistance::HumanAssistanceTool;

use crate::tools::{ToolError, ToolRegistry};

/// Registry with every built-in tool the configuration enables. The human
/// handoff tool needs a webhook and is skipped without one.
pub fn default_registry(
    config: &AppConfig,
    client: Client,
    thread_log: Arc<dyn ThreadLog>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::default();
    registry.register(CurrentTimeTool::new(
        client.clone(),
        config.tools.time_api_base_url.clone(),
        config.tools.default_timezone.clone(),
    ))?;

    if let Some(webhook_url) = &config.webhook.url {
        registry.register(HumanAssistanceTool::new(client, webhook_url.clone(), thread_log))?;
    }

    Ok(registry)
}
