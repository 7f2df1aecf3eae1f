use super::{AccountId, RecordId, SyncStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_KEY: &str = "id";
pub const ACCOUNT_ID_KEY: &str = "account_id";
pub const SYNC_STATUS_KEY: &str = "syncStatus";
pub const LAST_MODIFIED_KEY: &str = "lastModified";

/// JSON object form of a record, a patch, or a queue payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "Value", into = "Value")]
pub struct RecordPayload(Map<String, Value>);

impl RecordPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err("Record payload cannot be null".to_string()),
            _ => Err("Record payload must be a JSON object".to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Payload of a delete queue entry.
    pub fn id_only(id: &RecordId) -> Self {
        let mut map = Map::new();
        map.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn record_id(&self) -> Result<RecordId, String> {
        match self.0.get(ID_KEY) {
            Some(Value::String(id)) => RecordId::new(id.clone()),
            Some(_) => Err("Record id must be a string".to_string()),
            None => Err("Record payload is missing an id".to_string()),
        }
    }

    pub fn account_id(&self) -> Result<AccountId, String> {
        match self.0.get(ACCOUNT_ID_KEY) {
            Some(Value::String(id)) => AccountId::new(id.clone()),
            Some(_) => Err("Account id must be a string".to_string()),
            None => Err("Record payload is missing an account_id".to_string()),
        }
    }

    pub fn sync_status(&self) -> Option<SyncStatus> {
        self.0
            .get(SYNC_STATUS_KEY)
            .and_then(Value::as_str)
            .and_then(SyncStatus::parse)
    }

    pub fn last_modified(&self) -> Option<i64> {
        self.0.get(LAST_MODIFIED_KEY).and_then(Value::as_i64)
    }

    /// Shallow merge: top-level keys of `patch` replace the current ones.
    pub fn merge(&mut self, patch: &RecordPayload) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn set_sync_meta(&mut self, status: SyncStatus, last_modified_ms: i64) {
        self.0.insert(
            SYNC_STATUS_KEY.to_string(),
            Value::String(status.as_str().to_string()),
        );
        self.0
            .insert(LAST_MODIFIED_KEY.to_string(), Value::from(last_modified_ms));
    }

    /// Copy without device-only bookkeeping, as sent to the remote store.
    pub fn without_sync_meta(&self) -> RecordPayload {
        let mut map = self.0.clone();
        map.remove(SYNC_STATUS_KEY);
        map.remove(LAST_MODIFIED_KEY);
        Self(map)
    }
}

impl TryFrom<Value> for RecordPayload {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordPayload> for Value {
    fn from(payload: RecordPayload) -> Self {
        payload.into_inner()
    }
}
