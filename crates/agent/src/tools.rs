use std::collections::HashMap;

use async_trait::async_trait;
use relay_core::{ToolCall, ToolOutput};
use relay_db::ThreadLogError;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

/// JSON-schema description of a function tool, as advertised to the assistant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn as_assistant_tool(&self) -> Value {
        json!({ "type": "function", "function": self })
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),
    #[error("tool `{0}` is already registered")]
    DuplicateRegistration(String),
    #[error("upstream call failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    ThreadLog(#[from] ThreadLogError),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T) -> Result<(), ToolError>
    where
        T: Tool + 'static,
    {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateRegistration(name));
        }
        self.tools.insert(name, Box::new(tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names = self.tools.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.values().map(|tool| tool.definition()).collect::<Vec<_>>();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs one requested tool call. Never fails: unknown tools and tool
    /// errors are reported to the assistant as `{"error": ...}` outputs.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        let arguments = parse_arguments(call);

        let output = match self.tools.get(&call.name) {
            Some(tool) => match tool.execute(arguments).await {
                Ok(value) => {
                    info!(
                        event_name = "agent.tool.executed",
                        tool = %call.name,
                        tool_call_id = %call.id,
                        "tool call executed"
                    );
                    value
                }
                Err(tool_error) => {
                    warn!(
                        event_name = "agent.tool.failed",
                        tool = %call.name,
                        tool_call_id = %call.id,
                        error = %tool_error,
                        "tool call failed"
                    );
                    json!({ "error": tool_error.to_string() })
                }
            },
            None => {
                warn!(
                    event_name = "agent.tool.unknown",
                    tool = %call.name,
                    tool_call_id = %call.id,
                    "function not found in tool registry"
                );
                json!({ "error": format!("unknown tool `{}`", call.name) })
            }
        };

        ToolOutput {
            tool_call_id: call.id.clone(),
            output: serde_json::to_string(&output).unwrap_or_else(|_| "null".to_string()),
        }
    }
}

fn parse_arguments(call: &ToolCall) -> Value {
    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => {
            warn!(
                event_name = "agent.tool.arguments_not_object",
                tool = %call.name,
                arguments = %other,
                "tool arguments are not a JSON object"
            );
            Value::Object(Map::new())
        }
        Err(decode_error) => {
            error!(
                event_name = "agent.tool.arguments_invalid",
                tool = %call.name,
                error = %decode_error,
                input = %call.arguments,
                "JSON decoding of tool arguments failed"
            );
            Value::Object(Map::new())
        }
    }
}

/// Reads a non-blank string argument.
pub fn string_argument<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use relay_core::{ToolCall, ToolCallId};
    use serde_json::{json, Value};

    use super::{Tool, ToolDefinition, ToolError, ToolRegistry};

    struct EchoTool {
        seen: Arc<Mutex<Vec<Value>>>,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echoes its arguments.".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
            self.seen.lock().expect("lock").push(arguments.clone());
            Ok(json!({ "echo": arguments }))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "failing".to_string(),
                description: "Always fails.".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
            Err(ToolError::MissingArgument("name"))
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: ToolCallId("call_1".to_string()),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn registry() -> (ToolRegistry, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::default();
        registry.register(EchoTool { seen: seen.clone() }).expect("register echo");
        registry.register(FailingTool).expect("register failing");
        (registry, seen)
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut registry, seen) = registry();
        let error = registry.register(EchoTool { seen }).expect_err("duplicate should fail");
        assert!(matches!(error, ToolError::DuplicateRegistration(ref name) if name == "echo"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn definitions_are_sorted_and_wrapped_as_function_tools() {
        let (registry, _) = registry();
        assert_eq!(registry.names(), vec!["echo".to_string(), "failing".to_string()]);

        let wire = registry.definitions()[0].as_assistant_tool();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "echo");
    }

    #[tokio::test]
    async fn dispatch_serializes_tool_output_as_json_text() {
        let (registry, seen) = registry();

        let output = registry.dispatch(&call("echo", r#"{"timezone":"UTC"}"#)).await;

        assert_eq!(output.tool_call_id.as_str(), "call_1");
        assert_eq!(output.output, r#"{"echo":{"timezone":"UTC"}}"#);
        assert_eq!(seen.lock().expect("lock")[0], json!({"timezone": "UTC"}));
    }

    #[tokio::test]
    async fn malformed_arguments_fall_back_to_empty_object() {
        let (registry, seen) = registry();

        registry.dispatch(&call("echo", "{not json")).await;
        registry.dispatch(&call("echo", "[1, 2]")).await;

        let seen = seen.lock().expect("lock").clone();
        assert_eq!(seen, vec![json!({}), json!({})]);
    }

    #[tokio::test]
    async fn unknown_tool_produces_error_output() {
        let (registry, _) = registry();

        let output = registry.dispatch(&call("launch_rockets", "{}")).await;
        let parsed: Value = serde_json::from_str(&output.output).expect("json output");
        assert_eq!(parsed, json!({"error": "unknown tool `launch_rockets`"}));
    }

    #[tokio::test]
    async fn tool_errors_become_error_outputs() {
        let (registry, _) = registry();

        let output = registry.dispatch(&call("failing", "{}")).await;
        let parsed: Value = serde_json::from_str(&output.output).expect("json output");
        assert_eq!(parsed, json!({"error": "missing required argument `name`"}));
    }
}
