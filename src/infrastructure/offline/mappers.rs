use super::rows::{LocalRecordRow, SyncQueueItemRow};
use crate::domain::entities::offline::SyncQueueItem;
use crate::domain::value_objects::{
    AccountId, QueueOperation, RecordId, RecordPayload, SyncQueueId, SyncQueueStatus, SyncStatus,
    TableName,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::convert::TryInto;

pub fn payload_from_row(row: LocalRecordRow) -> Result<RecordPayload, AppError> {
    RecordPayload::from_json_str(&row.data).map_err(AppError::DeserializationError)
}

pub fn payload_to_json(payload: &RecordPayload) -> Result<String, AppError> {
    serde_json::to_string(payload.as_map())
        .map_err(|err| AppError::SerializationError(err.to_string()))
}

/// Column values mirrored out of a record payload.
pub struct RowColumns {
    pub id: RecordId,
    pub account_id: AccountId,
    pub data: String,
    pub sync_status: SyncStatus,
    pub last_modified: i64,
}

pub fn columns_from_payload(
    payload: &RecordPayload,
    now_ms: i64,
) -> Result<RowColumns, AppError> {
    Ok(RowColumns {
        id: payload.record_id().map_err(AppError::ValidationError)?,
        account_id: payload.account_id().map_err(AppError::ValidationError)?,
        data: payload_to_json(payload)?,
        sync_status: payload.sync_status().unwrap_or(SyncStatus::Queued),
        last_modified: payload.last_modified().unwrap_or(now_ms),
    })
}

pub fn domain_queue_item_from_row(row: SyncQueueItemRow) -> Result<SyncQueueItem, AppError> {
    let id = SyncQueueId::new(row.id).map_err(AppError::ValidationError)?;
    let operation = QueueOperation::parse(&row.operation).map_err(AppError::ValidationError)?;
    let table = row
        .table_name
        .parse::<TableName>()
        .map_err(AppError::ValidationError)?;
    let record_id = RecordId::new(row.record_id).map_err(AppError::ValidationError)?;
    let account_id = AccountId::new(row.account_id).map_err(AppError::ValidationError)?;
    let payload =
        RecordPayload::from_json_str(&row.payload).map_err(AppError::DeserializationError)?;

    Ok(SyncQueueItem {
        id,
        operation,
        table,
        record_id,
        account_id,
        payload,
        status: SyncQueueStatus::from(row.status.as_str()),
        retry_count: try_i64_to_u32(row.retry_count, "retry_count")?,
        max_retries: try_i64_to_u32(row.max_retries, "max_retries")?,
        next_attempt_at: millis_to_datetime(row.next_attempt_at),
        created_at: millis_to_datetime(row.created_at),
        updated_at: millis_to_datetime(row.updated_at),
        error_message: row.error_message,
    })
}

pub fn millis_to_datetime(value: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(value).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn try_i64_to_u32(value: i64, field: &str) -> Result<u32, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{field} is out of range: {value}")))
}
