use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use relay_core::AssistantId;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    assistant_id: AssistantId,
    tools: Vec<String>,
    thread_log_backend: &'static str,
}

impl HealthState {
    pub fn new(assistant_id: AssistantId, tools: Vec<String>, thread_log_backend: &'static str) -> Self {
        Self { assistant_id, tools, thread_log_backend }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub assistant_id: String,
    pub tool_count: usize,
    pub tools: Vec<String>,
    pub thread_log: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let thread_log = match state.thread_log_backend {
        "memory" => HealthCheck {
            status: "degraded",
            detail: "thread log disabled; threads are kept in memory only".to_string(),
        },
        backend => HealthCheck { status: "ready", detail: format!("{backend} backend configured") },
    };

    let payload = HealthResponse {
        status: "ready",
        assistant_id: state.assistant_id.to_string(),
        tool_count: state.tools.len(),
        tools: state.tools,
        thread_log,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
