pub mod offline;

pub use offline::{
    AccountId, QueueOperation, RecordId, RecordPayload, SyncQueueId, SyncQueueStatus, SyncStatus,
    TableName,
};
