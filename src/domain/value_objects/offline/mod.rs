pub mod account_id;
pub mod payload;
pub mod queue_operation;
pub mod record_id;
pub mod sync_queue_id;
pub mod sync_queue_status;
pub mod sync_status;
pub mod table_name;

pub use account_id::AccountId;
pub use payload::RecordPayload;
pub use queue_operation::QueueOperation;
pub use record_id::RecordId;
pub use sync_queue_id::SyncQueueId;
pub use sync_queue_status::SyncQueueStatus;
pub use sync_status::SyncStatus;
pub use table_name::TableName;
