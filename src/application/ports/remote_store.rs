use crate::domain::value_objects::{AccountId, RecordId, RecordPayload, TableName};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Table-oriented CRUD against the hosted database. Every call is scoped by account.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts rows, merging into any row that already has the same id so a replayed
    /// create cannot duplicate or fail.
    async fn upsert(&self, table: TableName, rows: &[RecordPayload]) -> Result<(), AppError>;
    async fn update(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
        fields: &RecordPayload,
    ) -> Result<(), AppError>;
    async fn delete(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
    ) -> Result<(), AppError>;
    async fn select(
        &self,
        table: TableName,
        account_id: &AccountId,
    ) -> Result<Vec<RecordPayload>, AppError>;
}
