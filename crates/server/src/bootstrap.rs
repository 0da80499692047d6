use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use relay_agent::assistant::{ensure_assistant, AssistantError};
use relay_agent::builtin::default_registry;
use relay_agent::{AssistantApi, OpenAiClient, PollSettings, RunPoller, ToolError};
use relay_core::config::{AppConfig, ConfigError, LoadOptions};
use relay_db::{ThreadLog, ThreadLogError};
use thiserror::Error;
use tracing::info;

use crate::health::{self, HealthState};
use crate::routes::{self, AppState};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
    pub health: HealthState,
}

impl Application {
    pub fn router(&self) -> Router {
        routes::router(self.state.clone()).merge(health::router(self.health.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("thread log initialization failed: {0}")]
    ThreadLog(#[from] ThreadLogError),
    #[error("tool registration failed: {0}")]
    Tools(#[from] ToolError),
    #[error("assistant provisioning failed: {0}")]
    Assistant(#[from] AssistantError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let api: Arc<dyn AssistantApi> =
        Arc::new(OpenAiClient::from_config(&config.openai).map_err(BootstrapError::HttpClient)?);
    let thread_log = relay_db::from_config(&config.thread_log).await?;
    info!(
        event_name = "system.bootstrap.thread_log_ready",
        correlation_id = "bootstrap",
        backend = thread_log.backend_name(),
        "thread log ready"
    );

    assemble(config, api, thread_log).await
}

/// Wires the registry, poller and assistant around an already built API and
/// thread log.
pub async fn assemble(
    config: AppConfig,
    api: Arc<dyn AssistantApi>,
    thread_log: Arc<dyn ThreadLog>,
) -> Result<Application, BootstrapError> {
    let tool_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.openai.timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)?;
    let registry = default_registry(&config, tool_client, thread_log.clone())?;
    let tool_names = registry.names();
    info!(
        event_name = "system.bootstrap.tools_registered",
        correlation_id = "bootstrap",
        tools = ?tool_names,
        "tools registered"
    );

    let assistant_id = ensure_assistant(api.as_ref(), &config.openai, &registry).await?;

    let poller =
        RunPoller::new(api.clone(), Arc::new(registry), PollSettings::from(&config.polling));
    let health = HealthState::new(assistant_id.clone(), tool_names, thread_log.backend_name());
    let state = AppState::new(api, poller, thread_log, assistant_id);

    info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        assistant_id = %state.assistant_id(),
        "application bootstrap complete"
    );
    Ok(Application { config, state, health })
}
