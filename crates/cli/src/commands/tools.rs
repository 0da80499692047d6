use std::sync::Arc;

use relay_agent::builtin::default_registry;
use relay_agent::ToolRegistry;
use relay_core::config::{AppConfig, LoadOptions};
use relay_db::InMemoryThreadLog;
use serde_json::Value;

use crate::commands::CommandResult;

pub fn run(json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "tools",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let registry = match registry_for(&config) {
        Ok(registry) => registry,
        Err(message) => return CommandResult::failure("tools", "tool_registry", message, 3),
    };

    if json_output {
        let definitions: Vec<Value> = registry
            .definitions()
            .iter()
            .map(|definition| definition.as_assistant_tool())
            .collect();
        return match serde_json::to_string_pretty(&definitions) {
            Ok(output) => CommandResult::text(output),
            Err(error) => CommandResult::failure("tools", "serialization", error.to_string(), 4),
        };
    }

    CommandResult::text(render_human(&registry))
}

/// Listing never executes a tool, so the handoff tool gets an in-memory log.
fn registry_for(config: &AppConfig) -> Result<ToolRegistry, String> {
    default_registry(config, reqwest::Client::new(), Arc::new(InMemoryThreadLog::default()))
        .map_err(|error| error.to_string())
}

fn render_human(registry: &ToolRegistry) -> String {
    let mut lines = vec![format!("{} tool(s) registered:", registry.len())];
    for definition in registry.definitions() {
        lines.push(format!("- {}: {}", definition.name, definition.description));
    }
    lines.join("\n")
}
