use serde::{Deserialize, Serialize};

/// Lifecycle of a queue entry. Confirmed entries are deleted rather than marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncQueueStatus {
    Pending,
    /// Dead-lettered: retries exhausted or the remote refused the mutation.
    Failed,
    Unknown(String),
}

impl SyncQueueStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SyncQueueStatus::Pending => "pending",
            SyncQueueStatus::Failed => "failed",
            SyncQueueStatus::Unknown(value) => value.as_str(),
        }
    }
}

impl From<&str> for SyncQueueStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => SyncQueueStatus::Pending,
            "failed" => SyncQueueStatus::Failed,
            other => SyncQueueStatus::Unknown(other.to_string()),
        }
    }
}
