use super::mappers::{domain_queue_item_from_row, payload_to_json};
use super::rows::SyncQueueItemRow;
use crate::application::ports::local_store::SyncQueueStore;
use crate::domain::entities::offline::{SyncQueueItem, SyncQueueItemDraft};
use crate::domain::value_objects::{AccountId, RecordId, SyncQueueId, SyncQueueStatus, TableName};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::collections::HashSet;

const QUEUE_COLUMNS: &str = r#"
    id, operation, table_name, record_id, account_id, payload, status,
    retry_count, max_retries, next_attempt_at, created_at, updated_at, error_message
"#;

pub struct SqliteSyncQueue {
    pool: Pool<Sqlite>,
}

impl SqliteSyncQueue {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_rows(rows: Vec<SyncQueueItemRow>) -> Result<Vec<SyncQueueItem>, AppError> {
        rows.into_iter().map(domain_queue_item_from_row).collect()
    }
}

/// Inserts a fresh pending entry on `conn`, which may be inside a caller's transaction.
pub(super) async fn insert_entry(
    conn: &mut SqliteConnection,
    draft: &SyncQueueItemDraft,
) -> Result<SyncQueueId, AppError> {
    let payload = payload_to_json(&draft.payload)?;
    let now = Utc::now().timestamp_millis();

    let result = sqlx::query(
        r#"
        INSERT INTO sync_queue (
            operation, table_name, record_id, account_id, payload, status,
            retry_count, max_retries, next_attempt_at, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, 'pending', 0, ?6, 0, ?7, ?7)
        "#,
    )
    .bind(draft.operation.as_str())
    .bind(draft.table.as_str())
    .bind(draft.record_id.as_str())
    .bind(draft.account_id.as_str())
    .bind(&payload)
    .bind(i64::from(draft.max_retries))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    SyncQueueId::new(result.last_insert_rowid()).map_err(AppError::Internal)
}

/// Ids with any queue entry, pending or dead-lettered.
pub(super) async fn outstanding_record_ids(
    conn: &mut SqliteConnection,
    table: TableName,
    account_id: &AccountId,
) -> Result<HashSet<RecordId>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT record_id FROM sync_queue
        WHERE status IN ('pending', 'failed') AND table_name = ?1 AND account_id = ?2
        "#,
    )
    .bind(table.as_str())
    .bind(account_id.as_str())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(id,)| RecordId::new(id).map_err(AppError::ValidationError))
        .collect()
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[async_trait]
impl SyncQueueStore for SqliteSyncQueue {
    async fn enqueue(&self, draft: SyncQueueItemDraft) -> Result<SyncQueueId, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_entry(&mut *conn, &draft).await
    }

    async fn pending_items(&self, limit: u32) -> Result<Vec<SyncQueueItem>, AppError> {
        let sql = format!(
            "SELECT {QUEUE_COLUMNS} FROM sync_queue WHERE status = 'pending' ORDER BY id ASC LIMIT ?1"
        );
        let rows = sqlx::query_as::<_, SyncQueueItemRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Self::map_rows(rows)
    }

    async fn remove(&self, id: SyncQueueId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        id: SyncQueueId,
        retry_count: u32,
        next_attempt_at: DateTime<Utc>,
        error_message: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE sync_queue
            SET retry_count = ?1,
                next_attempt_at = ?2,
                error_message = ?3,
                updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(i64::from(retry_count))
        .bind(next_attempt_at.timestamp_millis())
        .bind(error_message)
        .bind(Utc::now().timestamp_millis())
        .bind(id.value())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_dead_letter(
        &self,
        id: SyncQueueId,
        error_message: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = 'failed',
                retry_count = retry_count + 1,
                error_message = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(error_message)
        .bind(Utc::now().timestamp_millis())
        .bind(id.value())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_backoff(&self) -> Result<u32, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sync_queue
            SET next_attempt_at = 0
            WHERE status = 'pending' AND next_attempt_at > 0
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(to_u32(result.rows_affected()))
    }

    async fn count(&self, status: SyncQueueStatus) -> Result<u32, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_queue WHERE status = ?1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(u32::try_from(count).unwrap_or(0))
    }

    async fn has_pending_for(&self, table: TableName, id: &RecordId) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM sync_queue
            WHERE status = 'pending' AND table_name = ?1 AND record_id = ?2
            LIMIT 1
            "#,
        )
        .bind(table.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn list(&self, status: SyncQueueStatus) -> Result<Vec<SyncQueueItem>, AppError> {
        let sql =
            format!("SELECT {QUEUE_COLUMNS} FROM sync_queue WHERE status = ?1 ORDER BY id ASC");
        let rows = sqlx::query_as::<_, SyncQueueItemRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        Self::map_rows(rows)
    }

    async fn requeue_failed(&self) -> Result<u32, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = 'pending',
                retry_count = 0,
                next_attempt_at = 0,
                updated_at = ?1
            WHERE status = 'failed'
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(to_u32(result.rows_affected()))
    }
}
