use std::sync::Arc;

use async_trait::async_trait;
use relay_db::ThreadLog;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::info;

use crate::tools::{string_argument, Tool, ToolDefinition, ToolError};

const RECEIVED_MESSAGE: &str =
    "Your request for human assistance has been received. We will contact you soon.";

/// Hands a purchase-intent lead over to a human by posting the collected
/// contact details, tagged with the latest thread-log record, to a webhook.
pub struct HumanAssistanceTool {
    client: Client,
    webhook_url: String,
    thread_log: Arc<dyn ThreadLog>,
}

impl HumanAssistanceTool {
    pub fn new(client: Client, webhook_url: impl Into<String>, thread_log: Arc<dyn ThreadLog>) -> Self {
        Self { client, webhook_url: webhook_url.into(), thread_log }
    }
}

/// Front-ends sometimes double-encode free text; decode twice and keep
/// invalid sequences as replacement characters.
fn decode_twice(raw: &str) -> String {
    let once = String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned();
    String::from_utf8_lossy(&urlencoding::decode_binary(once.as_bytes())).into_owned()
}

#[async_trait]
impl Tool for HumanAssistanceTool {
    fn name(&self) -> &'static str {
        "human_assistance_request"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description:
                "Detects requests for an intention to buy something and collects user contact information."
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the user requesting to buy something."
                    },
                    "phone_number": {
                        "type": "string",
                        "description": "Phone number of the user."
                    },
                    "address": {
                        "type": "string",
                        "description": "Physical address of the user."
                    }
                },
                "required": ["name", "phone_number", "address"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let name = string_argument(&arguments, "name").ok_or(ToolError::MissingArgument("name"))?;
        let phone_number = string_argument(&arguments, "phone_number")
            .ok_or(ToolError::MissingArgument("phone_number"))?;
        let address =
            string_argument(&arguments, "address").ok_or(ToolError::MissingArgument("address"))?;
        let record_id = self.thread_log.latest_record_id().await?;

        let payload = json!({
            "name": decode_twice(name),
            "phone_number": phone_number,
            "address": decode_twice(address),
            "record_id": record_id,
        });

        let response = match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(error) => {
                return Ok(Value::String(format!("Failed to send data to the webhook: {error}")))
            }
        };

        if response.status() != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(Value::String(format!(
                "Error processing your request for human assistance: {body}"
            )));
        }

        info!(
            event_name = "agent.tool.human_assistance.sent",
            record_id = %record_id,
            "human assistance request forwarded to webhook"
        );
        Ok(Value::String(RECEIVED_MESSAGE.to_string()))
    }
}
