use async_trait::async_trait;
use relay_core::ThreadRecord;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{ThreadLog, ThreadLogError};

/// Thread log backed by an Airtable table exposing `Thread_id`, `Platform`,
/// `Username` and a `Created` timestamp field.
pub struct AirtableThreadLog {
    client: Client,
    url: String,
    api_key: SecretString,
    view: String,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<RecordRef>,
}

#[derive(Debug, Deserialize)]
struct RecordRef {
    id: String,
}

impl AirtableThreadLog {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: SecretString,
        view: impl Into<String>,
    ) -> Self {
        Self { client, url: url.into(), api_key, view: view.into() }
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }
}

#[async_trait]
impl ThreadLog for AirtableThreadLog {
    fn backend_name(&self) -> &'static str {
        "airtable"
    }

    async fn add_thread(&self, record: &ThreadRecord) -> Result<(), ThreadLogError> {
        let payload = json!({
            "records": [{
                "fields": {
                    "Thread_id": record.thread_id.as_str(),
                    "Platform": record.platform,
                    "Username": record.username,
                }
            }]
        });

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", self.authorization())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "thread_log.airtable.rejected",
                thread_id = %record.thread_id,
                status = status.as_u16(),
                "airtable rejected thread record"
            );
            return Err(ThreadLogError::Rejected { status: status.as_u16(), body });
        }

        info!(
            event_name = "thread_log.airtable.added",
            thread_id = %record.thread_id,
            "thread added to airtable"
        );
        Ok(())
    }

    async fn latest_record_id(&self) -> Result<String, ThreadLogError> {
        let response = self
            .client
            .get(&self.url)
            .header("Authorization", self.authorization())
            .query(&[
                ("maxRecords", "1"),
                ("view", self.view.as_str()),
                ("sort[0][field]", "Created"),
                ("sort[0][direction]", "desc"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ThreadLogError::Rejected { status: status.as_u16(), body });
        }

        let list: RecordList =
            response.json().await.map_err(|error| ThreadLogError::Decode(error.to_string()))?;
        list.records.into_iter().next().map(|record| record.id).ok_or(ThreadLogError::NoRecords)
    }
}
