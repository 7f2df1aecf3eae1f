use crate::domain::entities::farm::FarmEntity;
use crate::domain::value_objects::{AccountId, RecordId, RecordPayload, SyncStatus};
use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};

/// A domain entity as cached on the device, with identity and sync bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: RecordId,
    pub account_id: AccountId,
    #[serde(rename = "syncStatus")]
    pub sync_status: SyncStatus,
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
    #[serde(flatten)]
    pub fields: T,
}

impl<T: FarmEntity> Record<T> {
    /// Fresh record with a client-generated id, waiting for its first remote ack.
    pub fn new_queued(account_id: AccountId, fields: T, now_ms: i64) -> Self {
        Self {
            id: RecordId::generate(),
            account_id,
            sync_status: SyncStatus::Queued,
            last_modified: now_ms,
            fields,
        }
    }

    pub fn to_payload(&self) -> Result<RecordPayload, AppError> {
        let value = serde_json::to_value(self)?;
        RecordPayload::new(value).map_err(AppError::SerializationError)
    }

    pub fn from_payload(payload: RecordPayload) -> Result<Self, AppError> {
        serde_json::from_value(payload.into_inner())
            .map_err(|err| AppError::DeserializationError(format!("{}: {err}", T::TABLE)))
    }

    pub fn is_pending(&self) -> bool {
        self.sync_status == SyncStatus::Queued
    }
}
