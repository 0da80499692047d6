use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["relay.toml", "config/relay.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub thread_log: ThreadLogConfig,
    pub webhook: WebhookConfig,
    pub polling: PollingConfig,
    pub tools: ToolsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub assistant_id: Option<String>,
    pub assistant_name: String,
    pub assistant_file: PathBuf,
    pub instructions_path: PathBuf,
    pub resources_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ThreadLogConfig {
    pub backend: ThreadLogBackend,
    pub airtable_url: Option<String>,
    pub airtable_api_key: Option<SecretString>,
    pub airtable_view: String,
    pub database_url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    pub url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PollingConfig {
    pub deadline_secs: u64,
    pub interval_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ToolsConfig {
    pub time_api_base_url: String,
    pub default_timezone: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadLogBackend {
    Airtable,
    Sqlite,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub assistant_id: Option<String>,
    pub assistant_file: Option<PathBuf>,
    pub thread_log_backend: Option<ThreadLogBackend>,
    pub database_url: Option<String>,
    pub webhook_url: Option<String>,
    pub polling_deadline_secs: Option<u64>,
    pub polling_interval_ms: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig {
                api_key: String::new().into(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4-1106-preview".to_string(),
                timeout_secs: 30,
                assistant_id: None,
                assistant_name: "Relay Assistant".to_string(),
                assistant_file: PathBuf::from("assistant.json"),
                instructions_path: PathBuf::from("prompts/instructions.txt"),
                resources_dir: PathBuf::from("resources"),
            },
            thread_log: ThreadLogConfig {
                backend: ThreadLogBackend::Disabled,
                airtable_url: None,
                airtable_api_key: None,
                airtable_view: "All".to_string(),
                database_url: "sqlite://relay.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            webhook: WebhookConfig::default(),
            polling: PollingConfig { deadline_secs: 8, interval_ms: 2_000 },
            tools: ToolsConfig {
                time_api_base_url: "http://worldtimeapi.org/api/timezone/".to_string(),
                default_timezone: "America/Mexico_City".to_string(),
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ThreadLogBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "airtable" => Ok(Self::Airtable),
            "sqlite" => Ok(Self::Sqlite),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unsupported thread log backend `{other}` (expected airtable|sqlite|disabled)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());
        let mut backend_explicit = false;

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            backend_explicit |= patch.thread_log.as_ref().is_some_and(|log| log.backend.is_some());
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("relay.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        backend_explicit |= config.apply_env_overrides()?;
        backend_explicit |= options.overrides.thread_log_backend.is_some();
        config.apply_overrides(options.overrides);

        // A bare Airtable URL is how the service has always been deployed.
        if !backend_explicit && config.thread_log.airtable_url.is_some() {
            config.thread_log.backend = ThreadLogBackend::Airtable;
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(openai) = patch.openai {
            if let Some(api_key) = openai.api_key {
                self.openai.api_key = secret_value(api_key);
            }
            if let Some(base_url) = openai.base_url {
                self.openai.base_url = base_url;
            }
            if let Some(model) = openai.model {
                self.openai.model = model;
            }
            if let Some(timeout_secs) = openai.timeout_secs {
                self.openai.timeout_secs = timeout_secs;
            }
            if let Some(assistant_id) = openai.assistant_id {
                self.openai.assistant_id = Some(assistant_id);
            }
            if let Some(assistant_name) = openai.assistant_name {
                self.openai.assistant_name = assistant_name;
            }
            if let Some(assistant_file) = openai.assistant_file {
                self.openai.assistant_file = assistant_file;
            }
            if let Some(instructions_path) = openai.instructions_path {
                self.openai.instructions_path = instructions_path;
            }
            if let Some(resources_dir) = openai.resources_dir {
                self.openai.resources_dir = resources_dir;
            }
        }

        if let Some(thread_log) = patch.thread_log {
            if let Some(backend) = thread_log.backend {
                self.thread_log.backend = backend;
            }
            if let Some(airtable_url) = thread_log.airtable_url {
                self.thread_log.airtable_url = Some(airtable_url);
            }
            if let Some(airtable_api_key) = thread_log.airtable_api_key {
                self.thread_log.airtable_api_key = Some(secret_value(airtable_api_key));
            }
            if let Some(airtable_view) = thread_log.airtable_view {
                self.thread_log.airtable_view = airtable_view;
            }
            if let Some(database_url) = thread_log.database_url {
                self.thread_log.database_url = database_url;
            }
            if let Some(max_connections) = thread_log.max_connections {
                self.thread_log.max_connections = max_connections;
            }
            if let Some(timeout_secs) = thread_log.timeout_secs {
                self.thread_log.timeout_secs = timeout_secs;
            }
        }

        if let Some(webhook) = patch.webhook {
            if let Some(url) = webhook.url {
                self.webhook.url = Some(url);
            }
        }

        if let Some(polling) = patch.polling {
            if let Some(deadline_secs) = polling.deadline_secs {
                self.polling.deadline_secs = deadline_secs;
            }
            if let Some(interval_ms) = polling.interval_ms {
                self.polling.interval_ms = interval_ms;
            }
        }

        if let Some(tools) = patch.tools {
            if let Some(time_api_base_url) = tools.time_api_base_url {
                self.tools.time_api_base_url = time_api_base_url;
            }
            if let Some(default_timezone) = tools.default_timezone {
                self.tools.default_timezone = default_timezone;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    /// Returns whether the thread log backend was selected explicitly.
    fn apply_env_overrides(&mut self) -> Result<bool, ConfigError> {
        if let Some(value) = read_env("RELAY_OPENAI_API_KEY").or_else(|| read_env("OPENAI_API_KEY"))
        {
            self.openai.api_key = secret_value(value);
        }
        if let Some(value) = read_env("RELAY_OPENAI_BASE_URL") {
            self.openai.base_url = value;
        }
        if let Some(value) = read_env("RELAY_OPENAI_MODEL") {
            self.openai.model = value;
        }
        if let Some(value) = read_env("RELAY_OPENAI_TIMEOUT_SECS") {
            self.openai.timeout_secs = parse_u64("RELAY_OPENAI_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("RELAY_OPENAI_ASSISTANT_ID") {
            self.openai.assistant_id = Some(value);
        }
        if let Some(value) = read_env("RELAY_OPENAI_ASSISTANT_NAME") {
            self.openai.assistant_name = value;
        }
        if let Some(value) = read_env("RELAY_OPENAI_ASSISTANT_FILE") {
            self.openai.assistant_file = PathBuf::from(value);
        }
        if let Some(value) = read_env("RELAY_OPENAI_INSTRUCTIONS_PATH") {
            self.openai.instructions_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("RELAY_OPENAI_RESOURCES_DIR") {
            self.openai.resources_dir = PathBuf::from(value);
        }

        let mut backend_explicit = false;
        if let Some(value) = read_env("RELAY_THREAD_LOG_BACKEND") {
            self.thread_log.backend = value.parse()?;
            backend_explicit = true;
        }
        let airtable_url =
            read_env("RELAY_THREAD_LOG_AIRTABLE_URL").or_else(|| read_env("AIRTABLE_DB_URL"));
        if let Some(value) = airtable_url {
            self.thread_log.airtable_url = Some(value);
        }
        let airtable_api_key =
            read_env("RELAY_THREAD_LOG_AIRTABLE_API_KEY").or_else(|| read_env("AIRTABLE_API_KEY"));
        if let Some(value) = airtable_api_key {
            self.thread_log.airtable_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("RELAY_THREAD_LOG_AIRTABLE_VIEW") {
            self.thread_log.airtable_view = value;
        }
        if let Some(value) = read_env("RELAY_THREAD_LOG_DATABASE_URL") {
            self.thread_log.database_url = value;
        }
        if let Some(value) = read_env("RELAY_THREAD_LOG_MAX_CONNECTIONS") {
            self.thread_log.max_connections =
                parse_u32("RELAY_THREAD_LOG_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("RELAY_THREAD_LOG_TIMEOUT_SECS") {
            self.thread_log.timeout_secs = parse_u64("RELAY_THREAD_LOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RELAY_WEBHOOK_URL").or_else(|| read_env("WEBHOOK_URL")) {
            self.webhook.url = Some(value);
        }

        if let Some(value) = read_env("RELAY_POLLING_DEADLINE_SECS") {
            self.polling.deadline_secs = parse_u64("RELAY_POLLING_DEADLINE_SECS", &value)?;
        }
        if let Some(value) = read_env("RELAY_POLLING_INTERVAL_MS") {
            self.polling.interval_ms = parse_u64("RELAY_POLLING_INTERVAL_MS", &value)?;
        }

        if let Some(value) = read_env("RELAY_TOOLS_TIME_API_BASE_URL") {
            self.tools.time_api_base_url = value;
        }
        if let Some(value) = read_env("RELAY_TOOLS_DEFAULT_TIMEZONE") {
            self.tools.default_timezone = value;
        }

        if let Some(value) = read_env("RELAY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        let port = read_env("RELAY_SERVER_PORT")
            .map(|value| ("RELAY_SERVER_PORT", value))
            .or_else(|| read_env("PORT").map(|value| ("PORT", value)));
        if let Some((key, value)) = port {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env("RELAY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("RELAY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("RELAY_LOGGING_LEVEL").or_else(|| read_env("RELAY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("RELAY_LOGGING_FORMAT").or_else(|| read_env("RELAY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(backend_explicit)
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.openai_api_key {
            self.openai.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.openai_base_url {
            self.openai.base_url = base_url;
        }
        if let Some(assistant_id) = overrides.assistant_id {
            self.openai.assistant_id = Some(assistant_id);
        }
        if let Some(assistant_file) = overrides.assistant_file {
            self.openai.assistant_file = assistant_file;
        }
        if let Some(backend) = overrides.thread_log_backend {
            self.thread_log.backend = backend;
        }
        if let Some(database_url) = overrides.database_url {
            self.thread_log.database_url = database_url;
        }
        if let Some(webhook_url) = overrides.webhook_url {
            self.webhook.url = Some(webhook_url);
        }
        if let Some(deadline_secs) = overrides.polling_deadline_secs {
            self.polling.deadline_secs = deadline_secs;
        }
        if let Some(interval_ms) = overrides.polling_interval_ms {
            self.polling.interval_ms = interval_ms;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_openai(&self.openai)?;
        validate_thread_log(&self.thread_log)?;
        validate_webhook(&self.webhook)?;
        validate_polling(&self.polling)?;
        validate_tools(&self.tools)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_openai(openai: &OpenAiConfig) -> Result<(), ConfigError> {
    if openai.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "openai.api_key is required (set RELAY_OPENAI_API_KEY or OPENAI_API_KEY)".to_string(),
        ));
    }

    validate_http_url("openai.base_url", &openai.base_url)?;

    if openai.timeout_secs == 0 || openai.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "openai.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if openai.model.trim().is_empty() {
        return Err(ConfigError::Validation("openai.model must not be empty".to_string()));
    }

    if let Some(assistant_id) = &openai.assistant_id {
        if assistant_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "openai.assistant_id must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_thread_log(thread_log: &ThreadLogConfig) -> Result<(), ConfigError> {
    match thread_log.backend {
        ThreadLogBackend::Airtable => {
            let Some(url) = thread_log.airtable_url.as_deref() else {
                return Err(ConfigError::Validation(
                    "thread_log.airtable_url is required for the airtable backend (set AIRTABLE_DB_URL)"
                        .to_string(),
                ));
            };
            validate_http_url("thread_log.airtable_url", url)?;

            let missing_key = thread_log
                .airtable_api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing_key {
                return Err(ConfigError::Validation(
                    "thread_log.airtable_api_key is required for the airtable backend (set AIRTABLE_API_KEY)"
                        .to_string(),
                ));
            }
        }
        ThreadLogBackend::Sqlite => {
            let url = thread_log.database_url.trim();
            let sqlite_url =
                url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
            if !sqlite_url {
                return Err(ConfigError::Validation(
                    "thread_log.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                        .to_string(),
                ));
            }
            if thread_log.max_connections == 0 {
                return Err(ConfigError::Validation(
                    "thread_log.max_connections must be greater than zero".to_string(),
                ));
            }
            if thread_log.timeout_secs == 0 || thread_log.timeout_secs > 300 {
                return Err(ConfigError::Validation(
                    "thread_log.timeout_secs must be in range 1..=300".to_string(),
                ));
            }
        }
        ThreadLogBackend::Disabled => {}
    }

    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> Result<(), ConfigError> {
    match &webhook.url {
        Some(url) => validate_http_url("webhook.url", url),
        None => Ok(()),
    }
}

fn validate_polling(polling: &PollingConfig) -> Result<(), ConfigError> {
    if polling.deadline_secs == 0 || polling.deadline_secs > 60 {
        return Err(ConfigError::Validation(
            "polling.deadline_secs must be in range 1..=60".to_string(),
        ));
    }

    if polling.interval_ms == 0 || polling.interval_ms >= polling.deadline_secs * 1_000 {
        return Err(ConfigError::Validation(
            "polling.interval_ms must be greater than zero and shorter than polling.deadline_secs"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_tools(tools: &ToolsConfig) -> Result<(), ConfigError> {
    validate_http_url("tools.time_api_base_url", &tools.time_api_base_url)?;

    if tools.default_timezone.trim().is_empty() {
        return Err(ConfigError::Validation(
            "tools.default_timezone must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    openai: Option<OpenAiPatch>,
    thread_log: Option<ThreadLogPatch>,
    webhook: Option<WebhookPatch>,
    polling: Option<PollingPatch>,
    tools: Option<ToolsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    assistant_id: Option<String>,
    assistant_name: Option<String>,
    assistant_file: Option<PathBuf>,
    instructions_path: Option<PathBuf>,
    resources_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ThreadLogPatch {
    backend: Option<ThreadLogBackend>,
    airtable_url: Option<String>,
    airtable_api_key: Option<String>,
    airtable_view: Option<String>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PollingPatch {
    deadline_secs: Option<u64>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolsPatch {
    time_api_base_url: Option<String>,
    default_timezone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
