use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ThreadId;

pub const DEFAULT_PLATFORM: &str = "Not Specified";

/// A conversation thread as recorded in the thread log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: ThreadId,
    pub platform: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ThreadRecord {
    pub fn new(thread_id: ThreadId, platform: Option<String>, username: Option<String>) -> Self {
        let platform = platform
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        let username = username.filter(|value| !value.trim().is_empty());

        Self { thread_id, platform, username, created_at: Utc::now() }
    }
}
