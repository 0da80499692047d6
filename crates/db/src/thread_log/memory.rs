use std::collections::VecDeque;

use async_trait::async_trait;
use relay_core::ThreadRecord;
use tokio::sync::RwLock;

use super::{ThreadLog, ThreadLogError};

/// Most recent records kept in memory. Older ones are dropped.
pub const RETAINED_RECORDS: usize = 256;

#[derive(Default)]
struct MemoryState {
    total: u64,
    recent: VecDeque<(String, ThreadRecord)>,
}

/// Process-local thread log used when no external store is configured. Record
/// ids keep counting past the retention window.
#[derive(Default)]
pub struct InMemoryThreadLog {
    state: RwLock<MemoryState>,
}

impl InMemoryThreadLog {
    /// Retained records, oldest first.
    pub async fn records(&self) -> Vec<ThreadRecord> {
        self.state.read().await.recent.iter().map(|(_, record)| record.clone()).collect()
    }

    pub async fn total_recorded(&self) -> u64 {
        self.state.read().await.total
    }
}

#[async_trait]
impl ThreadLog for InMemoryThreadLog {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn add_thread(&self, record: &ThreadRecord) -> Result<(), ThreadLogError> {
        let mut state = self.state.write().await;
        state.total += 1;
        let record_id = format!("rec{:06}", state.total);
        if state.recent.len() == RETAINED_RECORDS {
            state.recent.pop_front();
        }
        state.recent.push_back((record_id, record.clone()));
        Ok(())
    }

    async fn latest_record_id(&self) -> Result<String, ThreadLogError> {
        let state = self.state.read().await;
        state.recent.back().map(|(record_id, _)| record_id.clone()).ok_or(ThreadLogError::NoRecords)
    }
}

#[cfg(test)]
mod tests {
    use relay_core::{ThreadId, ThreadRecord};

    use super::{InMemoryThreadLog, RETAINED_RECORDS};
    use crate::thread_log::{ThreadLog, ThreadLogError};

    #[tokio::test]
    async fn empty_log_has_no_latest_record() {
        let log = InMemoryThreadLog::default();
        assert!(matches!(log.latest_record_id().await, Err(ThreadLogError::NoRecords)));
    }

    #[tokio::test]
    async fn latest_record_tracks_last_insert() {
        let log = InMemoryThreadLog::default();
        for thread in ["thread_a", "thread_b"] {
            log.add_thread(&ThreadRecord::new(ThreadId(thread.to_string()), None, None))
                .await
                .expect("insert");
        }

        assert_eq!(log.latest_record_id().await.expect("latest"), "rec000002");
        assert_eq!(log.records().await.len(), 2);
    }

    #[tokio::test]
    async fn retention_is_bounded_while_ids_keep_counting() {
        let log = InMemoryThreadLog::default();
        let inserts = RETAINED_RECORDS * 4 + 3;
        for index in 0..inserts {
            log.add_thread(&ThreadRecord::new(ThreadId(format!("thread_{index}")), None, None))
                .await
                .expect("insert");
        }

        let records = log.records().await;
        assert_eq!(records.len(), RETAINED_RECORDS);
        assert_eq!(
            records.last().map(|record| record.thread_id.as_str().to_string()),
            Some(format!("thread_{}", inserts - 1))
        );
        assert_eq!(log.total_recorded().await, inserts as u64);
        assert_eq!(log.latest_record_id().await.expect("latest"), format!("rec{inserts:06}"));
    }
}
