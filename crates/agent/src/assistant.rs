use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use relay_core::config::OpenAiConfig;
use relay_core::AssistantId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::api::{ApiError, AssistantApi, AssistantSpec};
use crate::tools::ToolRegistry;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("assistant file `{path}` is invalid: {message}")]
    Decode { path: PathBuf, message: String },
}

#[derive(Debug, Deserialize, Serialize)]
struct AssistantFile {
    assistant_id: String,
}

/// Returns the assistant to run threads against, creating one on first start.
pub async fn ensure_assistant(
    api: &dyn AssistantApi,
    config: &OpenAiConfig,
    tools: &ToolRegistry,
) -> Result<AssistantId, AssistantError> {
    if let Some(configured) = config.assistant_id.as_deref() {
        let id = AssistantId::parse(configured).map_err(ApiError::from)?;
        info!(event_name = "agent.assistant.configured", assistant_id = %id, "using configured assistant");
        return Ok(id);
    }

    if let Some(id) = read_assistant_file(&config.assistant_file).await? {
        info!(
            event_name = "agent.assistant.loaded",
            assistant_id = %id,
            path = %config.assistant_file.display(),
            "loaded existing assistant"
        );
        return Ok(id);
    }

    let file_ids = upload_resources(api, &config.resources_dir).await?;
    let instructions = read_optional(&config.instructions_path).await?.unwrap_or_default();

    let mut wire_tools: Vec<_> =
        tools.definitions().iter().map(|definition| definition.as_assistant_tool()).collect();
    if !file_ids.is_empty() {
        wire_tools.push(json!({ "type": "file_search" }));
    }

    let id = api
        .create_assistant(AssistantSpec {
            name: config.assistant_name.clone(),
            instructions,
            model: config.model.clone(),
            tools: wire_tools,
            file_ids,
        })
        .await?;

    write_assistant_file(&config.assistant_file, &id).await?;
    info!(
        event_name = "agent.assistant.created",
        assistant_id = %id,
        path = %config.assistant_file.display(),
        "created new assistant"
    );
    Ok(id)
}

async fn read_optional(path: &Path) -> Result<Option<String>, AssistantError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AssistantError::Io { path: path.to_path_buf(), source }),
    }
}

/// Reads the id persisted by an earlier provisioning run, if the file exists.
pub async fn read_assistant_file(path: &Path) -> Result<Option<AssistantId>, AssistantError> {
    let Some(contents) = read_optional(path).await? else {
        return Ok(None);
    };

    let decoded: AssistantFile = serde_json::from_str(&contents).map_err(|error| {
        AssistantError::Decode { path: path.to_path_buf(), message: error.to_string() }
    })?;
    let id = AssistantId::parse(&decoded.assistant_id).map_err(|error| AssistantError::Decode {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;
    Ok(Some(id))
}

async fn write_assistant_file(path: &Path, id: &AssistantId) -> Result<(), AssistantError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AssistantError::Io { path: parent.to_path_buf(), source })?;
    }

    let body = serde_json::to_string_pretty(&AssistantFile { assistant_id: id.to_string() })
        .map_err(|error| AssistantError::Decode {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
    tokio::fs::write(path, body)
        .await
        .map_err(|source| AssistantError::Io { path: path.to_path_buf(), source })
}

async fn upload_resources(
    api: &dyn AssistantApi,
    dir: &Path,
) -> Result<Vec<String>, AssistantError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(AssistantError::Io { path: dir.to_path_buf(), source }),
    };

    let io_error = |source: std::io::Error| AssistantError::Io { path: dir.to_path_buf(), source };
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        if entry.file_type().await.map_err(io_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut file_ids = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| AssistantError::Io { path: path.clone(), source })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_id = api.upload_file(&name, bytes).await?;
        info!(event_name = "agent.assistant.file_uploaded", file = %name, file_id = %file_id, "uploaded resource");
        file_ids.push(file_id);
    }
    Ok(file_ids)
}
