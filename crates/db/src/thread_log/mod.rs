//! Thread log: where every new conversation thread is recorded together with
//! the platform and username that opened it.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::config::{ThreadLogBackend, ThreadLogConfig};
use relay_core::{ApplicationError, ThreadRecord};
use thiserror::Error;

pub mod airtable;
pub mod memory;
pub mod sql;

pub use airtable::AirtableThreadLog;
pub use memory::InMemoryThreadLog;
pub use sql::SqlThreadLog;

use crate::{connect_with_settings, migrations};

#[derive(Debug, Error)]
pub enum ThreadLogError {
    #[error("thread log request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("thread log rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("thread log response could not be decoded: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("thread log is not configured: {0}")]
    Configuration(String),
    #[error("no thread records found")]
    NoRecords,
}

impl From<ThreadLogError> for ApplicationError {
    fn from(value: ThreadLogError) -> Self {
        match value {
            ThreadLogError::Configuration(message) => ApplicationError::Configuration(message),
            other => ApplicationError::ThreadLog(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ThreadLog: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn add_thread(&self, record: &ThreadRecord) -> Result<(), ThreadLogError>;

    /// Identifier of the most recently created record.
    async fn latest_record_id(&self) -> Result<String, ThreadLogError>;
}

/// Builds the configured backend. The sqlite backend is migrated before it is returned.
pub async fn from_config(config: &ThreadLogConfig) -> Result<Arc<dyn ThreadLog>, ThreadLogError> {
    match config.backend {
        ThreadLogBackend::Airtable => {
            let url = config.airtable_url.clone().ok_or_else(|| {
                ThreadLogError::Configuration("thread_log.airtable_url is missing".to_string())
            })?;
            let api_key = config.airtable_api_key.clone().ok_or_else(|| {
                ThreadLogError::Configuration("thread_log.airtable_api_key is missing".to_string())
            })?;
            Ok(Arc::new(AirtableThreadLog::new(
                reqwest::Client::new(),
                url,
                api_key,
                config.airtable_view.clone(),
            )))
        }
        ThreadLogBackend::Sqlite => {
            let pool = connect_with_settings(
                &config.database_url,
                config.max_connections,
                config.timeout_secs,
            )
            .await?;
            migrations::run_pending(&pool).await?;
            Ok(Arc::new(SqlThreadLog::new(pool)))
        }
        ThreadLogBackend::Disabled => Ok(Arc::new(InMemoryThreadLog::default())),
    }
}
