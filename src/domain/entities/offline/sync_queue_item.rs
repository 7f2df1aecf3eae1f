use crate::domain::value_objects::{
    AccountId, QueueOperation, RecordId, RecordPayload, SyncQueueId, SyncQueueStatus, TableName,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncQueueItemDraft {
    pub operation: QueueOperation,
    pub table: TableName,
    pub record_id: RecordId,
    pub account_id: AccountId,
    pub payload: RecordPayload,
    pub max_retries: u32,
}

impl SyncQueueItemDraft {
    pub fn new(
        operation: QueueOperation,
        table: TableName,
        record_id: RecordId,
        account_id: AccountId,
        payload: RecordPayload,
        max_retries: u32,
    ) -> Self {
        Self {
            operation,
            table,
            record_id,
            account_id,
            payload,
            max_retries,
        }
    }
}

/// One pending mutation awaiting remote confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncQueueItem {
    pub id: SyncQueueId,
    pub operation: QueueOperation,
    pub table: TableName,
    pub record_id: RecordId,
    pub account_id: AccountId,
    pub payload: RecordPayload,
    pub status: SyncQueueStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl SyncQueueItem {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at <= now
    }

    pub fn record_key(&self) -> (TableName, RecordId) {
        (self.table, self.record_id.clone())
    }

    /// Whether one more failure exhausts the retry budget.
    pub fn is_last_attempt(&self) -> bool {
        self.retry_count + 1 >= self.max_retries
    }
}
