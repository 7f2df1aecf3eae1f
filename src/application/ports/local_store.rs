use crate::domain::entities::offline::{SyncQueueItem, SyncQueueItemDraft, TableHydration};
use crate::domain::value_objects::{
    AccountId, QueueOperation, RecordId, RecordPayload, SyncQueueId, SyncQueueStatus, SyncStatus,
    TableName,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// A local write that must be replayed against the remote store.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalMutation {
    Insert(RecordPayload),
    /// Shallow patch. The queued payload is the merged row.
    Patch { id: RecordId, patch: RecordPayload },
    Remove(RecordId),
}

impl LocalMutation {
    pub fn operation(&self) -> QueueOperation {
        match self {
            LocalMutation::Insert(_) => QueueOperation::Create,
            LocalMutation::Patch { .. } => QueueOperation::Update,
            LocalMutation::Remove(_) => QueueOperation::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommittedMutation {
    /// Row as written; for removals, the id-only payload that was queued.
    pub row: RecordPayload,
    pub queue_id: SyncQueueId,
}

/// Per-table cache of records on the device.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn list(
        &self,
        table: TableName,
        account_id: &AccountId,
    ) -> Result<Vec<RecordPayload>, AppError>;
    async fn get(&self, table: TableName, id: &RecordId)
        -> Result<Option<RecordPayload>, AppError>;
    /// Fails with `DuplicateKey` when the id is taken.
    async fn add(&self, table: TableName, row: &RecordPayload) -> Result<(), AppError>;
    /// Merges `patch` into the stored row and returns the merged row. Fails with `NotFound`.
    async fn update(
        &self,
        table: TableName,
        id: &RecordId,
        patch: &RecordPayload,
    ) -> Result<RecordPayload, AppError>;
    /// Returns whether a row was removed.
    async fn delete(&self, table: TableName, id: &RecordId) -> Result<bool, AppError>;
    async fn set_sync_status(
        &self,
        table: TableName,
        id: &RecordId,
        status: SyncStatus,
    ) -> Result<(), AppError>;
    /// Makes the account's rows match `rows`. Any row with a queue entry, pending or
    /// dead-lettered, is left untouched; the queue is read in the same transaction.
    async fn replace_account_rows(
        &self,
        table: TableName,
        account_id: &AccountId,
        rows: Vec<RecordPayload>,
    ) -> Result<TableHydration, AppError>;
    /// Applies `mutation` and enqueues its replay atomically: either both land or neither.
    /// Patches and removals of rows owned by another account fail with `NotFound`.
    async fn commit_mutation(
        &self,
        table: TableName,
        account_id: &AccountId,
        mutation: LocalMutation,
        max_retries: u32,
    ) -> Result<CommittedMutation, AppError>;
    /// Revision counter bumped after every committed change to `table`.
    fn subscribe(&self, table: TableName) -> watch::Receiver<u64>;
}

/// Durable FIFO of mutations waiting for the remote store.
#[async_trait]
pub trait SyncQueueStore: Send + Sync {
    async fn enqueue(&self, draft: SyncQueueItemDraft) -> Result<SyncQueueId, AppError>;
    /// Pending entries in insertion order, due or not.
    async fn pending_items(&self, limit: u32) -> Result<Vec<SyncQueueItem>, AppError>;
    async fn remove(&self, id: SyncQueueId) -> Result<(), AppError>;
    async fn record_failure(
        &self,
        id: SyncQueueId,
        retry_count: u32,
        next_attempt_at: DateTime<Utc>,
        error_message: &str,
    ) -> Result<(), AppError>;
    async fn mark_dead_letter(&self, id: SyncQueueId, error_message: &str)
        -> Result<(), AppError>;
    /// Makes every pending entry due immediately. Returns the number touched.
    async fn reset_backoff(&self) -> Result<u32, AppError>;
    async fn count(&self, status: SyncQueueStatus) -> Result<u32, AppError>;
    async fn has_pending_for(&self, table: TableName, id: &RecordId) -> Result<bool, AppError>;
    async fn list(&self, status: SyncQueueStatus) -> Result<Vec<SyncQueueItem>, AppError>;
    /// Moves dead-lettered entries back to pending with a fresh retry budget.
    async fn requeue_failed(&self) -> Result<u32, AppError>;
}
