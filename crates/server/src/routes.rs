//! Chat front-end endpoints.
//!
//! - `GET  /start?platform=&username=` - open a thread and record it
//! - `POST /chat  {thread_id, message}` - post a message and start a run
//! - `POST /check {thread_id, run_id}` - poll the run for a bounded time

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use relay_agent::{ApiError, AssistantApi, RunPoller};
use relay_core::{ApplicationError, AssistantId, CheckOutcome, RunId, ThreadId, ThreadRecord};
use relay_db::ThreadLog;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    api: Arc<dyn AssistantApi>,
    poller: RunPoller,
    thread_log: Arc<dyn ThreadLog>,
    assistant_id: AssistantId,
}

impl AppState {
    pub fn new(
        api: Arc<dyn AssistantApi>,
        poller: RunPoller,
        thread_log: Arc<dyn ThreadLog>,
        assistant_id: AssistantId,
    ) -> Self {
        Self { api, poller, thread_log, assistant_id }
    }

    pub fn assistant_id(&self) -> &AssistantId {
        &self.assistant_id
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    pub platform: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub thread_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub thread_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub run_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckRequest {
    pub thread_id: Option<String>,
    pub run_id: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckReply {
    Outcome(CheckOutcome),
    MissingFields { response: &'static str },
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

type Failure = (StatusCode, Json<ErrorBody>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", get(start))
        .route("/chat", post(chat))
        .route("/check", post(check))
        .with_state(state)
}

pub async fn start(
    State(state): State<AppState>,
    Query(query): Query<StartQuery>,
) -> Result<Json<StartResponse>, Failure> {
    let correlation_id = Uuid::new_v4().to_string();
    let thread_id = state
        .api
        .create_thread()
        .await
        .map_err(|error| upstream_failure("start", &correlation_id, error))?;

    let record = ThreadRecord::new(thread_id.clone(), query.platform, query.username);
    match state.thread_log.add_thread(&record).await {
        Ok(()) => info!(
            event_name = "server.thread.started",
            correlation_id = %correlation_id,
            thread_id = %thread_id,
            platform = %record.platform,
            thread_log = state.thread_log.backend_name(),
            "new thread started"
        ),
        Err(log_error) => warn!(
            event_name = "server.thread.log_failed",
            correlation_id = %correlation_id,
            thread_id = %thread_id,
            thread_log = state.thread_log.backend_name(),
            error = %log_error,
            "thread started but could not be recorded"
        ),
    }

    Ok(Json(StartResponse { thread_id: thread_id.to_string() }))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, Failure> {
    let correlation_id = Uuid::new_v4().to_string();
    let Some(thread_id) = present(body.thread_id).map(ThreadId) else {
        warn!(event_name = "server.chat.missing_thread", correlation_id = %correlation_id, "chat without thread id");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody { error: "Missing thread_id".to_string(), correlation_id: None }),
        ));
    };
    let message = body.message.unwrap_or_default();

    info!(
        event_name = "server.chat.received",
        correlation_id = %correlation_id,
        thread_id = %thread_id,
        message_chars = message.chars().count(),
        "received chat message"
    );

    state
        .api
        .add_user_message(&thread_id, &message)
        .await
        .map_err(|error| upstream_failure("chat", &correlation_id, error))?;
    let run_id = state
        .api
        .create_run(&thread_id, &state.assistant_id)
        .await
        .map_err(|error| upstream_failure("chat", &correlation_id, error))?;

    info!(
        event_name = "server.chat.run_started",
        correlation_id = %correlation_id,
        thread_id = %thread_id,
        run_id = %run_id,
        "run started"
    );
    Ok(Json(ChatResponse { run_id: run_id.to_string() }))
}

pub async fn check(
    State(state): State<AppState>,
    Json(body): Json<CheckRequest>,
) -> Result<Json<CheckReply>, Failure> {
    let correlation_id = Uuid::new_v4().to_string();
    let (Some(thread_id), Some(run_id)) = (present(body.thread_id), present(body.run_id)) else {
        warn!(event_name = "server.check.missing_fields", correlation_id = %correlation_id, "check without thread or run id");
        return Ok(Json(CheckReply::MissingFields { response: "error" }));
    };
    let (thread_id, run_id) = (ThreadId(thread_id), RunId(run_id));

    let outcome = state
        .poller
        .check(&thread_id, &run_id)
        .await
        .map_err(|error| upstream_failure("check", &correlation_id, error))?;

    info!(
        event_name = "server.check.finished",
        correlation_id = %correlation_id,
        thread_id = %thread_id,
        run_id = %run_id,
        status = ?outcome.status,
        "run check finished"
    );
    Ok(Json(CheckReply::Outcome(outcome)))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn upstream_failure(operation: &'static str, correlation_id: &str, error: ApiError) -> Failure {
    error!(
        event_name = "server.upstream.error",
        correlation_id = %correlation_id,
        operation,
        error = %error,
        "assistant api call failed"
    );

    let interface = ApplicationError::from(error).into_interface(correlation_id);
    let status =
        StatusCode::from_u16(interface.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: interface.user_message().to_string(),
            correlation_id: Some(interface.correlation_id().to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        extract::{Query, State},
        http::{Request, StatusCode},
        Json,
    };
    use relay_agent::scripted::ScriptedAssistantApi;
    use relay_agent::{PollSettings, RunPoller, ToolRegistry};
    use relay_core::{AssistantId, CheckOutcome, RunStatus, DEFAULT_PLATFORM};
    use relay_db::InMemoryThreadLog;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{
        chat, check, router, start, AppState, ChatRequest, CheckReply, CheckRequest, StartQuery,
    };

    fn state_with(
        api: Arc<ScriptedAssistantApi>,
        thread_log: Arc<InMemoryThreadLog>,
    ) -> State<AppState> {
        let poller = RunPoller::new(
            api.clone(),
            Arc::new(ToolRegistry::default()),
            PollSettings { deadline: Duration::from_millis(200), interval: Duration::from_millis(5) },
        );
        State(AppState::new(api, poller, thread_log, AssistantId("asst_test".to_string())))
    }

    #[tokio::test]
    async fn start_creates_thread_and_records_it() {
        let api = Arc::new(ScriptedAssistantApi::new());
        let log = Arc::new(InMemoryThreadLog::default());

        let Json(response) = start(
            state_with(api, log.clone()),
            Query(StartQuery { platform: Some("web".to_string()), username: None }),
        )
        .await
        .expect("start should succeed");

        assert_eq!(response.thread_id, "thread_001");
        let records = log.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].thread_id.as_str(), "thread_001");
        assert_eq!(records[0].platform, "web");
        assert_eq!(records[0].username, None);
    }

    #[tokio::test]
    async fn start_defaults_platform_when_absent() {
        let api = Arc::new(ScriptedAssistantApi::new());
        let log = Arc::new(InMemoryThreadLog::default());

        start(state_with(api, log.clone()), Query(StartQuery::default()))
            .await
            .expect("start should succeed");

        assert_eq!(log.records().await[0].platform, DEFAULT_PLATFORM);
    }

    #[tokio::test]
    async fn start_maps_upstream_failure_to_service_unavailable() {
        let api = Arc::new(ScriptedAssistantApi::new().failing_with(502));
        let log = Arc::new(InMemoryThreadLog::default());

        let (status, Json(body)) = start(state_with(api, log.clone()), Query(StartQuery::default()))
            .await
            .expect_err("upstream failure");

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.correlation_id.is_some());
        assert!(log.records().await.is_empty());
    }

    #[tokio::test]
    async fn chat_without_thread_id_is_rejected() {
        let api = Arc::new(ScriptedAssistantApi::new());
        let log = Arc::new(InMemoryThreadLog::default());

        let (status, Json(body)) = chat(
            state_with(api.clone(), log),
            Json(ChatRequest { thread_id: Some("  ".to_string()), message: Some("hi".to_string()) }),
        )
        .await
        .expect_err("missing thread");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Missing thread_id");
        assert!(api.messages().is_empty());
    }

    #[tokio::test]
    async fn chat_posts_message_and_starts_run() {
        let api = Arc::new(ScriptedAssistantApi::new());
        let log = Arc::new(InMemoryThreadLog::default());

        let Json(response) = chat(
            state_with(api.clone(), log),
            Json(ChatRequest { thread_id: Some("thread_9".to_string()), message: None }),
        )
        .await
        .expect("chat should succeed");

        assert_eq!(response.run_id, "run_001");
        let messages = api.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0.as_str(), "thread_9");
        assert_eq!(messages[0].1, "");
        assert_eq!(api.started_runs()[0].1.as_str(), "asst_test");
    }

    #[tokio::test]
    async fn check_with_missing_fields_reports_error() {
        let api = Arc::new(ScriptedAssistantApi::new());
        let log = Arc::new(InMemoryThreadLog::default());

        let Json(reply) = check(
            state_with(api.clone(), log),
            Json(CheckRequest { thread_id: Some("thread_1".to_string()), run_id: None }),
        )
        .await
        .expect("check should respond");

        assert_eq!(reply, CheckReply::MissingFields { response: "error" });
        assert_eq!(api.retrieve_calls(), 0);
    }

    #[tokio::test]
    async fn check_returns_completed_reply() {
        let api = Arc::new(
            ScriptedAssistantApi::new().then_status(RunStatus::Completed).with_reply("Hola  amigo"),
        );
        let log = Arc::new(InMemoryThreadLog::default());

        let Json(reply) = check(
            state_with(api, log),
            Json(CheckRequest {
                thread_id: Some("thread_1".to_string()),
                run_id: Some("run_1".to_string()),
            }),
        )
        .await
        .expect("check should respond");

        assert_eq!(reply, CheckReply::Outcome(CheckOutcome::completed("Hola amigo")));
    }

    #[tokio::test]
    async fn router_serves_check_timeout_as_json() {
        let api = Arc::new(ScriptedAssistantApi::new().then_status(RunStatus::Queued));
        let log = Arc::new(InMemoryThreadLog::default());
        let State(state) = state_with(api, log);

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/check")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"thread_id":"thread_1","run_id":"run_1"}"#))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload, json!({"response": "timeout", "status": "timeout"}));
    }

    #[tokio::test]
    async fn router_serves_start_with_query() {
        let api = Arc::new(ScriptedAssistantApi::new());
        let log = Arc::new(InMemoryThreadLog::default());
        let State(state) = state_with(api, log.clone());

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/start?platform=whatsapp&username=ana")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload, json!({"thread_id": "thread_001"}));
        assert_eq!(log.records().await[0].username.as_deref(), Some("ana"));
    }
}
