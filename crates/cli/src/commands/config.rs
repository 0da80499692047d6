use std::env;
use std::fs;
use std::path::Path;

use relay_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::migrate::backend_label;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let openai = &config.openai;
    let thread_log = &config.thread_log;

    vec![
        Field {
            key: "openai.api_key",
            value: redact_secret(Some(&openai.api_key)),
            env_keys: &["RELAY_OPENAI_API_KEY", "OPENAI_API_KEY"],
        },
        Field {
            key: "openai.base_url",
            value: openai.base_url.clone(),
            env_keys: &["RELAY_OPENAI_BASE_URL"],
        },
        Field { key: "openai.model", value: openai.model.clone(), env_keys: &["RELAY_OPENAI_MODEL"] },
        Field {
            key: "openai.timeout_secs",
            value: openai.timeout_secs.to_string(),
            env_keys: &["RELAY_OPENAI_TIMEOUT_SECS"],
        },
        Field {
            key: "openai.assistant_name",
            value: openai.assistant_name.clone(),
            env_keys: &["RELAY_OPENAI_ASSISTANT_NAME"],
        },
        Field {
            key: "openai.assistant_id",
            value: openai.assistant_id.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["RELAY_OPENAI_ASSISTANT_ID"],
        },
        Field {
            key: "openai.assistant_file",
            value: display_path(&openai.assistant_file),
            env_keys: &["RELAY_OPENAI_ASSISTANT_FILE"],
        },
        Field {
            key: "openai.instructions_path",
            value: display_path(&openai.instructions_path),
            env_keys: &["RELAY_OPENAI_INSTRUCTIONS_PATH"],
        },
        Field {
            key: "openai.resources_dir",
            value: display_path(&openai.resources_dir),
            env_keys: &["RELAY_OPENAI_RESOURCES_DIR"],
        },
        Field {
            key: "thread_log.backend",
            value: backend_label(thread_log.backend).to_string(),
            env_keys: &["RELAY_THREAD_LOG_BACKEND"],
        },
        Field {
            key: "thread_log.airtable_url",
            value: thread_log.airtable_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["RELAY_THREAD_LOG_AIRTABLE_URL", "AIRTABLE_DB_URL"],
        },
        Field {
            key: "thread_log.airtable_api_key",
            value: redact_secret(thread_log.airtable_api_key.as_ref()),
            env_keys: &["RELAY_THREAD_LOG_AIRTABLE_API_KEY", "AIRTABLE_API_KEY"],
        },
        Field {
            key: "thread_log.airtable_view",
            value: thread_log.airtable_view.clone(),
            env_keys: &["RELAY_THREAD_LOG_AIRTABLE_VIEW"],
        },
        Field {
            key: "thread_log.database_url",
            value: thread_log.database_url.clone(),
            env_keys: &["RELAY_THREAD_LOG_DATABASE_URL"],
        },
        Field {
            key: "thread_log.max_connections",
            value: thread_log.max_connections.to_string(),
            env_keys: &["RELAY_THREAD_LOG_MAX_CONNECTIONS"],
        },
        Field {
            key: "thread_log.timeout_secs",
            value: thread_log.timeout_secs.to_string(),
            env_keys: &["RELAY_THREAD_LOG_TIMEOUT_SECS"],
        },
        Field {
            key: "webhook.url",
            value: config.webhook.url.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["RELAY_WEBHOOK_URL", "WEBHOOK_URL"],
        },
        Field {
            key: "polling.deadline_secs",
            value: config.polling.deadline_secs.to_string(),
            env_keys: &["RELAY_POLLING_DEADLINE_SECS"],
        },
        Field {
            key: "polling.interval_ms",
            value: config.polling.interval_ms.to_string(),
            env_keys: &["RELAY_POLLING_INTERVAL_MS"],
        },
        Field {
            key: "tools.time_api_base_url",
            value: config.tools.time_api_base_url.clone(),
            env_keys: &["RELAY_TOOLS_TIME_API_BASE_URL"],
        },
        Field {
            key: "tools.default_timezone",
            value: config.tools.default_timezone.clone(),
            env_keys: &["RELAY_TOOLS_DEFAULT_TIMEZONE"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["RELAY_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["RELAY_SERVER_PORT", "PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["RELAY_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["RELAY_LOGGING_LEVEL", "RELAY_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
            env_keys: &["RELAY_LOGGING_FORMAT", "RELAY_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// Keeps the text before the first `-` (so `sk-abc` renders as `sk-***`).
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };

    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
