use std::time::Duration;

use async_trait::async_trait;
use relay_core::config::OpenAiConfig;
use relay_core::{AssistantId, Run, RunId, RunStatus, ThreadId, ToolCall, ToolCallId, ToolOutput};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiError, AssistantApi, AssistantSpec};

const ASSISTANTS_BETA_HEADER: &str = "assistants=v2";

/// HTTP client for an OpenAI-compatible Assistants v2 API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    thread_id: String,
    status: String,
    #[serde(default)]
    required_action: Option<RequiredAction>,
}

#[derive(Debug, Deserialize)]
struct RequiredAction {
    #[serde(default)]
    submit_tool_outputs: Option<SubmitToolOutputs>,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputs {
    #[serde(default)]
    tool_calls: Vec<ToolCallObject>,
}

#[derive(Debug, Deserialize)]
struct ToolCallObject {
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    #[serde(default)]
    content: Vec<Value>,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url, api_key })
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", ASSISTANTS_BETA_HEADER)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let response = self.authorized(self.client.post(self.url(path))).json(body).send().await?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response =
            self.authorized(self.client.get(self.url(path))).query(query).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status { status: status.as_u16(), body });
    }
    response.json::<T>().await.map_err(|error| ApiError::Decode(error.to_string()))
}

fn first_text_part(content: &[Value]) -> Option<String> {
    content.iter().find_map(|part| {
        if part.get("type").and_then(Value::as_str) != Some("text") {
            return None;
        }
        part.pointer("/text/value").and_then(Value::as_str).map(str::to_string)
    })
}

fn into_run(object: RunObject) -> Result<Run, ApiError> {
    let required_tool_calls = object
        .required_action
        .and_then(|action| action.submit_tool_outputs)
        .map(|submit| submit.tool_calls)
        .unwrap_or_default()
        .into_iter()
        .map(|call| -> Result<ToolCall, ApiError> {
            Ok(ToolCall {
                id: ToolCallId::parse(call.id)?,
                name: call.function.name,
                arguments: call.function.arguments,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Run {
        id: RunId::parse(object.id)?,
        thread_id: ThreadId::parse(object.thread_id)?,
        status: RunStatus::parse(&object.status),
        required_tool_calls,
    })
}

#[async_trait]
impl AssistantApi for OpenAiClient {
    async fn create_thread(&self) -> Result<ThreadId, ApiError> {
        let created: IdOnly = self.post_json("threads", &json!({})).await?;
        Ok(ThreadId::parse(created.id)?)
    }

    async fn add_user_message(&self, thread: &ThreadId, content: &str) -> Result<(), ApiError> {
        let _: IdOnly = self
            .post_json(
                &format!("threads/{thread}/messages"),
                &json!({ "role": "user", "content": content }),
            )
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<RunId, ApiError> {
        let created: IdOnly = self
            .post_json(&format!("threads/{thread}/runs"), &json!({ "assistant_id": assistant }))
            .await?;
        Ok(RunId::parse(created.id)?)
    }

    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run, ApiError> {
        let object: RunObject = self.get_json(&format!("threads/{thread}/runs/{run}"), &[]).await?;
        into_run(object)
    }

    async fn latest_message_text(&self, thread: &ThreadId) -> Result<Option<String>, ApiError> {
        let list: MessageList = self
            .get_json(&format!("threads/{thread}/messages"), &[("order", "desc"), ("limit", "1")])
            .await?;
        Ok(list.data.first().and_then(|message| first_text_part(&message.content)))
    }

    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> Result<(), ApiError> {
        debug!(
            event_name = "assistant.api.submit_tool_outputs",
            thread_id = %thread,
            run_id = %run,
            output_count = outputs.len(),
            "submitting tool outputs"
        );
        let _: IdOnly = self
            .post_json(
                &format!("threads/{thread}/runs/{run}/submit_tool_outputs"),
                &json!({ "tool_outputs": outputs }),
            )
            .await?;
        Ok(())
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let response =
            self.authorized(self.client.post(self.url("files"))).multipart(form).send().await?;
        let uploaded: IdOnly = decode(response).await?;
        Ok(uploaded.id)
    }

    async fn create_assistant(&self, spec: AssistantSpec) -> Result<AssistantId, ApiError> {
        let mut body = json!({
            "name": spec.name,
            "instructions": spec.instructions,
            "model": spec.model,
            "tools": spec.tools,
        });
        if !spec.file_ids.is_empty() {
            body["tool_resources"] = json!({
                "file_search": { "vector_stores": [{ "file_ids": spec.file_ids }] }
            });
        }

        let created: IdOnly = self.post_json("assistants", &body).await?;
        Ok(AssistantId::parse(created.id)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use relay_core::config::{AppConfig, OpenAiConfig};
    use relay_core::{AssistantId, RunId, RunStatus, ThreadId, ToolCallId, ToolOutput};
    use serde_json::{json, Value};

    use super::OpenAiClient;
    use crate::api::{ApiError, AssistantApi};

    #[derive(Clone, Default)]
    struct Captured {
        bodies: Arc<Mutex<Vec<(String, Value)>>>,
        headers: Arc<Mutex<Vec<(Option<String>, Option<String>)>>>,
    }

    impl Captured {
        fn record(&self, route: &str, headers: &HeaderMap, body: Value) {
            let header = |name: &str| {
                headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
            };
            self.headers.lock().expect("lock").push((header("authorization"), header("openai-beta")));
            self.bodies.lock().expect("lock").push((route.to_string(), body));
        }
    }

    async fn spawn_stub(captured: Captured) -> String {
        let app = Router::new()
            .route(
                "/v1/threads",
                post(|State(c): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    c.record("threads", &headers, body);
                    Json(json!({"id": "thread_new", "object": "thread"}))
                }),
            )
            .route(
                "/v1/threads/{thread}/messages",
                post(
                    |State(c): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        c.record("messages", &headers, body);
                        Json(json!({"id": "msg_1"}))
                    },
                )
                .get(|Path(thread): Path<String>| async move {
                    if thread == "thread_empty" {
                        return Json(json!({"data": []}));
                    }
                    Json(json!({"data": [{
                        "id": "msg_2",
                        "role": "assistant",
                        "content": [{"type": "text", "text": {"value": "Hola【1†faq】", "annotations": []}}]
                    }]}))
                }),
            )
            .route(
                "/v1/threads/{thread}/runs",
                post(|State(c): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    c.record("runs", &headers, body);
                    Json(json!({"id": "run_new", "status": "queued"}))
                }),
            )
            .route(
                "/v1/threads/{thread}/runs/{run}",
                get(|Path((thread, run)): Path<(String, String)>| async move {
                    if run == "run_missing" {
                        return (StatusCode::NOT_FOUND, Json(json!({"error": {"message": "No run"}})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "id": run,
                            "thread_id": thread,
                            "status": "requires_action",
                            "required_action": {
                                "type": "submit_tool_outputs",
                                "submit_tool_outputs": {"tool_calls": [{
                                    "id": "call_1",
                                    "type": "function",
                                    "function": {"name": "get_current_time", "arguments": "{\"timezone\":\"Europe/Madrid\"}"}
                                }]}
                            }
                        })),
                    )
                }),
            )
            .route(
                "/v1/threads/{thread}/runs/{run}/submit_tool_outputs",
                post(|State(c): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    c.record("submit", &headers, body);
                    Json(json!({"id": "run_1", "status": "queued"}))
                }),
            )
            .route(
                "/v1/assistants",
                post(|State(c): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    c.record("assistants", &headers, body);
                    Json(json!({"id": "asst_new"}))
                }),
            )
            .with_state(captured);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{address}/v1/")
    }

    fn client(base_url: String) -> OpenAiClient {
        OpenAiClient::new(base_url, "sk-test".to_string().into(), Duration::from_secs(5))
            .expect("client")
    }

    #[tokio::test]
    async fn from_config_trims_trailing_slash_from_base_url() {
        let config = OpenAiConfig {
            base_url: "https://api.example.test/v1/".to_string(),
            ..AppConfig::default().openai
        };

        let api = OpenAiClient::from_config(&config).expect("client");
        assert_eq!(api.base_url, "https://api.example.test/v1");
    }

    #[tokio::test]
    async fn requests_carry_auth_and_beta_headers() {
        let captured = Captured::default();
        let api = client(spawn_stub(captured.clone()).await);

        let thread = api.create_thread().await.expect("create thread");
        assert_eq!(thread.as_str(), "thread_new");

        let headers = captured.headers.lock().expect("lock").clone();
        assert_eq!(headers[0].0.as_deref(), Some("Bearer sk-test"));
        assert_eq!(headers[0].1.as_deref(), Some("assistants=v2"));
    }

    #[tokio::test]
    async fn chat_turn_posts_message_then_run() {
        let captured = Captured::default();
        let api = client(spawn_stub(captured.clone()).await);
        let thread = ThreadId("thread_1".to_string());

        api.add_user_message(&thread, "what time is it?").await.expect("message");
        let run = api
            .create_run(&thread, &AssistantId("asst_1".to_string()))
            .await
            .expect("run");
        assert_eq!(run.as_str(), "run_new");

        let bodies = captured.bodies.lock().expect("lock").clone();
        assert_eq!(bodies[0], ("messages".to_string(), json!({"role": "user", "content": "what time is it?"})));
        assert_eq!(bodies[1], ("runs".to_string(), json!({"assistant_id": "asst_1"})));
    }

    #[tokio::test]
    async fn retrieve_run_decodes_required_tool_calls() {
        let api = client(spawn_stub(Captured::default()).await);

        let run = api
            .retrieve_run(&ThreadId("thread_1".to_string()), &RunId("run_1".to_string()))
            .await
            .expect("run");

        assert_eq!(run.status, RunStatus::RequiresAction);
        assert_eq!(run.required_tool_calls.len(), 1);
        assert_eq!(run.required_tool_calls[0].id, ToolCallId("call_1".to_string()));
        assert_eq!(run.required_tool_calls[0].name, "get_current_time");
        assert_eq!(run.required_tool_calls[0].arguments, "{\"timezone\":\"Europe/Madrid\"}");
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let api = client(spawn_stub(Captured::default()).await);

        let error = api
            .retrieve_run(&ThreadId("thread_1".to_string()), &RunId("run_missing".to_string()))
            .await
            .expect_err("missing run should fail");

        match error {
            ApiError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("No run"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn latest_message_text_reads_first_text_part() {
        let api = client(spawn_stub(Captured::default()).await);

        let text = api.latest_message_text(&ThreadId("thread_1".to_string())).await.expect("text");
        assert_eq!(text.as_deref(), Some("Hola【1†faq】"));

        let empty =
            api.latest_message_text(&ThreadId("thread_empty".to_string())).await.expect("empty");
        assert_eq!(empty, None);
    }

    #[tokio::test]
    async fn tool_outputs_are_submitted_in_one_request() {
        let captured = Captured::default();
        let api = client(spawn_stub(captured.clone()).await);

        api.submit_tool_outputs(
            &ThreadId("thread_1".to_string()),
            &RunId("run_1".to_string()),
            vec![
                ToolOutput { tool_call_id: ToolCallId("call_1".to_string()), output: "\"a\"".to_string() },
                ToolOutput { tool_call_id: ToolCallId("call_2".to_string()), output: "{}".to_string() },
            ],
        )
        .await
        .expect("submit");

        let bodies = captured.bodies.lock().expect("lock").clone();
        assert_eq!(
            bodies[0].1,
            json!({"tool_outputs": [
                {"tool_call_id": "call_1", "output": "\"a\""},
                {"tool_call_id": "call_2", "output": "{}"}
            ]})
        );
    }

    #[tokio::test]
    async fn create_assistant_attaches_files_for_search() {
        let captured = Captured::default();
        let api = client(spawn_stub(captured.clone()).await);

        let id = api
            .create_assistant(crate::api::AssistantSpec {
                name: "Relay".to_string(),
                instructions: "Be brief.".to_string(),
                model: "gpt-4o".to_string(),
                tools: vec![json!({"type": "file_search"})],
                file_ids: vec!["file_1".to_string()],
            })
            .await
            .expect("assistant");
        assert_eq!(id.as_str(), "asst_new");

        let bodies = captured.bodies.lock().expect("lock").clone();
        let body = &bodies[0].1;
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["tool_resources"]["file_search"]["vector_stores"][0]["file_ids"][0], "file_1");
    }
}
