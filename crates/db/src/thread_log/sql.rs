use async_trait::async_trait;
use relay_core::ThreadRecord;
use uuid::Uuid;

use super::{ThreadLog, ThreadLogError};
use crate::DbPool;

pub struct SqlThreadLog {
    pool: DbPool,
}

impl SqlThreadLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ThreadLog for SqlThreadLog {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn add_thread(&self, record: &ThreadRecord) -> Result<(), ThreadLogError> {
        let record_id = format!("rec{}", Uuid::new_v4().simple());
        sqlx::query(
            "INSERT INTO thread_record (record_id, thread_id, platform, username, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record_id)
        .bind(record.thread_id.as_str())
        .bind(&record.platform)
        .bind(record.username.as_deref())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_record_id(&self) -> Result<String, ThreadLogError> {
        let latest: Option<String> = sqlx::query_scalar(
            "SELECT record_id FROM thread_record ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        latest.ok_or(ThreadLogError::NoRecords)
    }
}

#[cfg(test)]
mod tests {
    use relay_core::{ThreadId, ThreadRecord};

    use super::SqlThreadLog;
    use crate::thread_log::{ThreadLog, ThreadLogError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlThreadLog {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlThreadLog::new(pool)
    }

    #[tokio::test]
    async fn add_thread_persists_platform_and_username() {
        let log = setup().await;
        let record = ThreadRecord::new(
            ThreadId("thread_abc".to_string()),
            Some("whatsapp".to_string()),
            Some("maria".to_string()),
        );

        log.add_thread(&record).await.expect("insert");

        let (platform, username): (String, Option<String>) =
            sqlx::query_as("SELECT platform, username FROM thread_record WHERE thread_id = ?")
                .bind("thread_abc")
                .fetch_one(log.pool())
                .await
                .expect("row");
        assert_eq!(platform, "whatsapp");
        assert_eq!(username.as_deref(), Some("maria"));
    }

    #[tokio::test]
    async fn latest_record_id_prefers_newest_insert() {
        let log = setup().await;
        log.add_thread(&ThreadRecord::new(ThreadId("thread_1".to_string()), None, None))
            .await
            .expect("first insert");
        log.add_thread(&ThreadRecord::new(ThreadId("thread_2".to_string()), None, None))
            .await
            .expect("second insert");

        let expected: String =
            sqlx::query_scalar("SELECT record_id FROM thread_record WHERE thread_id = 'thread_2'")
                .fetch_one(log.pool())
                .await
                .expect("row");
        assert_eq!(log.latest_record_id().await.expect("latest"), expected);
    }

    #[tokio::test]
    async fn empty_table_reports_no_records() {
        let log = setup().await;
        assert!(matches!(log.latest_record_id().await, Err(ThreadLogError::NoRecords)));
    }
}
