use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::tools::{string_argument, Tool, ToolDefinition, ToolError};

/// Looks up the current time for a timezone through the World Time API.
pub struct CurrentTimeTool {
    client: Client,
    base_url: String,
    default_timezone: String,
}

impl CurrentTimeTool {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        default_timezone: impl Into<String>,
    ) -> Self {
        Self { client, base_url: base_url.into(), default_timezone: default_timezone.into() }
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &'static str {
        "get_current_time"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description:
                "Obtains the current time from the World Time API for a specific timezone."
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": format!(
                            "The timezone to get the current time for. Defaults to {} if not specified.",
                            self.default_timezone
                        )
                    }
                },
                "required": []
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let timezone = string_argument(&arguments, "timezone")
            .unwrap_or(self.default_timezone.as_str())
            .to_string();
        let url = format!("{}{}", self.base_url, timezone);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                return Ok(Value::String(format!(
                    "Failed to connect to the World Time API: {error}"
                )))
            }
        };

        if response.status() != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(Value::String(format!(
                "Error retrieving the current time for {timezone}: {body}"
            )));
        }

        let payload: Value =
            response.json().await.map_err(|error| ToolError::Upstream(error.to_string()))?;
        let current_time = payload.get("datetime").and_then(Value::as_str).unwrap_or("unknown");

        Ok(json!({ "message": format!("The current time in {timezone} is: {current_time}") }))
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    use super::CurrentTimeTool;
    use crate::tools::Tool;

    async fn spawn_time_api() -> String {
        let app = Router::new().route(
            "/api/timezone/{*zone}",
            get(|Path(zone): Path<String>| async move {
                if zone == "Mars/Olympus" {
                    return (StatusCode::NOT_FOUND, "unknown location".to_string());
                }
                let body = json!({"timezone": zone, "datetime": "2024-01-05T10:15:00-06:00"});
                (StatusCode::OK, body.to_string())
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{address}/api/timezone/")
    }

    #[tokio::test]
    async fn missing_timezone_uses_default() {
        let tool =
            CurrentTimeTool::new(reqwest::Client::new(), spawn_time_api().await, "America/Mexico_City");

        let output = tool.execute(json!({})).await.expect("time lookup");
        assert_eq!(
            output,
            json!({"message": "The current time in America/Mexico_City is: 2024-01-05T10:15:00-06:00"})
        );
    }

    #[tokio::test]
    async fn explicit_timezone_is_requested() {
        let tool = CurrentTimeTool::new(reqwest::Client::new(), spawn_time_api().await, "UTC");

        let output = tool.execute(json!({"timezone": "Europe/Madrid"})).await.expect("time lookup");
        let message = output["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("The current time in Europe/Madrid is:"));
    }

    #[tokio::test]
    async fn api_errors_are_returned_as_text() {
        let tool = CurrentTimeTool::new(reqwest::Client::new(), spawn_time_api().await, "UTC");

        let output = tool.execute(json!({"timezone": "Mars/Olympus"})).await.expect("lookup");
        assert_eq!(
            output,
            Value::String(
                "Error retrieving the current time for Mars/Olympus: unknown location".to_string()
            )
        );
    }

    #[tokio::test]
    async fn connection_failures_are_returned_as_text() {
        let tool = CurrentTimeTool::new(reqwest::Client::new(), "http://127.0.0.1:9/", "UTC");

        let output = tool.execute(json!({})).await.expect("lookup");
        let text = output.as_str().unwrap_or_default();
        assert!(text.starts_with("Failed to connect to the World Time API:"));
    }

    #[test]
    fn definition_mentions_default_timezone() {
        let tool = CurrentTimeTool::new(reqwest::Client::new(), "http://localhost/", "Asia/Tokyo");
        let definition = tool.definition();
        assert_eq!(definition.name, "get_current_time");
        let description = definition.parameters["properties"]["timezone"]["description"]
            .as_str()
            .unwrap_or_default();
        assert!(description.contains("Asia/Tokyo"));
    }
}
