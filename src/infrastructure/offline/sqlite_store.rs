use super::mappers::{columns_from_payload, payload_from_row, payload_to_json, RowColumns};
use super::rows::LocalRecordRow;
use super::sqlite_queue::{insert_entry, outstanding_record_ids};
use crate::application::ports::local_store::{CommittedMutation, LocalMutation, LocalStore};
use crate::domain::entities::offline::{SyncQueueItemDraft, TableHydration};
use crate::domain::value_objects::offline::payload::{ACCOUNT_ID_KEY, ID_KEY, SYNC_STATUS_KEY};
use crate::domain::value_objects::{AccountId, RecordId, RecordPayload, SyncStatus, TableName};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::collections::HashSet;
use tokio::sync::watch;

/// SQLite-backed record cache: one table per collection, JSON body plus indexed columns.
pub struct SqliteLocalStore {
    pool: Pool<Sqlite>,
    revisions: [watch::Sender<u64>; 6],
}

impl SqliteLocalStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            revisions: std::array::from_fn(|_| watch::channel(0u64).0),
        }
    }

    fn revision(&self, table: TableName) -> &watch::Sender<u64> {
        &self.revisions[table as usize]
    }

    fn bump(&self, table: TableName) {
        self.revision(table).send_modify(|rev| *rev += 1);
    }
}

async fn fetch_row(
    conn: &mut SqliteConnection,
    table: TableName,
    id: &RecordId,
) -> Result<Option<LocalRecordRow>, AppError> {
    let sql = format!(
        "SELECT id, account_id, data, sync_status, last_modified FROM {} WHERE id = ?1",
        table.as_str()
    );
    let row = sqlx::query_as::<_, LocalRecordRow>(&sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn insert_row(
    conn: &mut SqliteConnection,
    table: TableName,
    cols: &RowColumns,
) -> Result<(), AppError> {
    let sql = format!(
        r#"
        INSERT INTO {} (id, account_id, data, sync_status, last_modified)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        table.as_str()
    );

    sqlx::query(&sql)
        .bind(cols.id.as_str())
        .bind(cols.account_id.as_str())
        .bind(&cols.data)
        .bind(cols.sync_status.as_str())
        .bind(cols.last_modified)
        .execute(&mut *conn)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::DuplicateKey(_) => {
                AppError::DuplicateKey(format!("{table} {} already exists", cols.id))
            }
            other => other,
        })?;
    Ok(())
}

/// Merges `patch` into an existing row. `owner` restricts the merge to one account.
async fn merge_row(
    conn: &mut SqliteConnection,
    table: TableName,
    id: &RecordId,
    patch: &RecordPayload,
    owner: Option<&AccountId>,
) -> Result<RecordPayload, AppError> {
    let existing = fetch_row(conn, table, id)
        .await?
        .filter(|row| owner.map_or(true, |owner| row.account_id == owner.as_str()))
        .ok_or_else(|| AppError::NotFound(format!("{table} {id}")))?;

    let account = existing.account_id.clone();
    let mut merged = payload_from_row(existing)?;
    merged.merge(patch);
    // identity and scope never change through a patch
    merged.insert(ID_KEY, Value::String(id.to_string()));
    merged.insert(ACCOUNT_ID_KEY, Value::String(account));

    let cols = columns_from_payload(&merged, Utc::now().timestamp_millis())?;
    let sql = format!(
        r#"
        UPDATE {}
        SET data = ?1, sync_status = ?2, last_modified = ?3
        WHERE id = ?4
        "#,
        table.as_str()
    );
    sqlx::query(&sql)
        .bind(&cols.data)
        .bind(cols.sync_status.as_str())
        .bind(cols.last_modified)
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(merged)
}

async fn delete_row(
    conn: &mut SqliteConnection,
    table: TableName,
    id: &RecordId,
    owner: Option<&AccountId>,
) -> Result<bool, AppError> {
    let result = match owner {
        Some(owner) => {
            let sql = format!(
                "DELETE FROM {} WHERE id = ?1 AND account_id = ?2",
                table.as_str()
            );
            sqlx::query(&sql)
                .bind(id.as_str())
                .bind(owner.as_str())
                .execute(&mut *conn)
                .await?
        }
        None => {
            let sql = format!("DELETE FROM {} WHERE id = ?1", table.as_str());
            sqlx::query(&sql)
                .bind(id.as_str())
                .execute(&mut *conn)
                .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn list(
        &self,
        table: TableName,
        account_id: &AccountId,
    ) -> Result<Vec<RecordPayload>, AppError> {
        let sql = format!(
            r#"
            SELECT id, account_id, data, sync_status, last_modified
            FROM {}
            WHERE account_id = ?1
            ORDER BY rowid ASC
            "#,
            table.as_str()
        );
        let rows = sqlx::query_as::<_, LocalRecordRow>(&sql)
            .bind(account_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(payload_from_row).collect()
    }

    async fn get(
        &self,
        table: TableName,
        id: &RecordId,
    ) -> Result<Option<RecordPayload>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_row(&mut *conn, table, id)
            .await?
            .map(payload_from_row)
            .transpose()
    }

    async fn add(&self, table: TableName, row: &RecordPayload) -> Result<(), AppError> {
        let cols = columns_from_payload(row, Utc::now().timestamp_millis())?;
        let mut conn = self.pool.acquire().await?;
        insert_row(&mut *conn, table, &cols).await?;

        self.bump(table);
        Ok(())
    }

    async fn update(
        &self,
        table: TableName,
        id: &RecordId,
        patch: &RecordPayload,
    ) -> Result<RecordPayload, AppError> {
        let mut tx = self.pool.begin().await?;
        let merged = merge_row(&mut *tx, table, id, patch, None).await?;
        tx.commit().await?;

        self.bump(table);
        Ok(merged)
    }

    async fn delete(&self, table: TableName, id: &RecordId) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        let removed = delete_row(&mut *conn, table, id, None).await?;
        if removed {
            self.bump(table);
        }
        Ok(removed)
    }

    async fn set_sync_status(
        &self,
        table: TableName,
        id: &RecordId,
        status: SyncStatus,
    ) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_row(&mut *conn, table, id).await? else {
            return Ok(());
        };
        if row.sync_status == status.as_str() {
            return Ok(());
        }

        let mut payload = payload_from_row(row)?;
        payload.insert(SYNC_STATUS_KEY, Value::String(status.as_str().to_string()));
        let data = payload_to_json(&payload)?;

        let sql = format!(
            "UPDATE {} SET data = ?1, sync_status = ?2 WHERE id = ?3",
            table.as_str()
        );
        let result = sqlx::query(&sql)
            .bind(&data)
            .bind(status.as_str())
            .bind(id.as_str())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() > 0 {
            self.bump(table);
        }
        Ok(())
    }

    async fn replace_account_rows(
        &self,
        table: TableName,
        account_id: &AccountId,
        rows: Vec<RecordPayload>,
    ) -> Result<TableHydration, AppError> {
        let now = Utc::now().timestamp_millis();
        let upsert = format!(
            r#"
            INSERT INTO {} (id, account_id, data, sync_status, last_modified)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                account_id = excluded.account_id,
                data = excluded.data,
                sync_status = excluded.sync_status,
                last_modified = excluded.last_modified
            "#,
            table.as_str()
        );
        let existing_sql = format!("SELECT id FROM {} WHERE account_id = ?1", table.as_str());

        let mut stats = TableHydration::default();
        let mut tx = self.pool.begin().await?;

        let preserve = outstanding_record_ids(&mut *tx, table, account_id).await?;
        let existing: Vec<(String,)> = sqlx::query_as(&existing_sql)
            .bind(account_id.as_str())
            .fetch_all(&mut *tx)
            .await?;

        let mut incoming = HashSet::new();
        for row in rows {
            let cols = columns_from_payload(&row, now)?;
            if cols.account_id != *account_id {
                tracing::warn!(
                    table = %table,
                    record_id = %cols.id,
                    "skipping downloaded row scoped to another account"
                );
                continue;
            }
            incoming.insert(cols.id.clone());
            if preserve.contains(&cols.id) {
                stats.preserved += 1;
                continue;
            }

            sqlx::query(&upsert)
                .bind(cols.id.as_str())
                .bind(cols.account_id.as_str())
                .bind(&cols.data)
                .bind(cols.sync_status.as_str())
                .bind(cols.last_modified)
                .execute(&mut *tx)
                .await?;
            stats.upserted += 1;
        }

        for (id,) in existing {
            let id = RecordId::new(id).map_err(AppError::ValidationError)?;
            if incoming.contains(&id) {
                continue;
            }
            if preserve.contains(&id) {
                stats.preserved += 1;
                continue;
            }
            delete_row(&mut *tx, table, &id, None).await?;
            stats.removed += 1;
        }

        tx.commit().await?;
        self.bump(table);
        Ok(stats)
    }

    async fn commit_mutation(
        &self,
        table: TableName,
        account_id: &AccountId,
        mutation: LocalMutation,
        max_retries: u32,
    ) -> Result<CommittedMutation, AppError> {
        let operation = mutation.operation();
        let mut tx = self.pool.begin().await?;

        let (record_id, row) = match mutation {
            LocalMutation::Insert(row) => {
                let cols = columns_from_payload(&row, Utc::now().timestamp_millis())?;
                if cols.account_id != *account_id {
                    return Err(AppError::InvalidInput(format!(
                        "{table} {} belongs to another account",
                        cols.id
                    )));
                }
                insert_row(&mut *tx, table, &cols).await?;
                (cols.id, row)
            }
            LocalMutation::Patch { id, patch } => {
                let merged = merge_row(&mut *tx, table, &id, &patch, Some(account_id)).await?;
                (id, merged)
            }
            LocalMutation::Remove(id) => {
                if !delete_row(&mut *tx, table, &id, Some(account_id)).await? {
                    return Err(AppError::NotFound(format!("{table} {id}")));
                }
                let row = RecordPayload::id_only(&id);
                (id, row)
            }
        };

        let draft = SyncQueueItemDraft::new(
            operation,
            table,
            record_id,
            account_id.clone(),
            row.clone(),
            max_retries,
        );
        let queue_id = insert_entry(&mut *tx, &draft).await?;
        tx.commit().await?;

        self.bump(table);
        Ok(CommittedMutation { row, queue_id })
    }

    fn subscribe(&self, table: TableName) -> watch::Receiver<u64> {
        self.revision(table).subscribe()
    }
}
