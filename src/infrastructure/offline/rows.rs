use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocalRecordRow {
    pub id: String,
    pub account_id: String,
    pub data: String,
    pub sync_status: String,
    pub last_modified: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyncQueueItemRow {
    pub id: i64,
    pub operation: String,
    pub table_name: String,
    pub record_id: String,
    pub account_id: String,
    pub payload: String,
    pub status: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub next_attempt_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub error_message: Option<String>,
}
