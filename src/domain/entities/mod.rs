pub mod farm;
pub mod offline;

pub use farm::{Expense, Farm, FarmEntity, FeedingLog, MaterialLog, Stock, Tank};
pub use offline::{
    HydrationReport, NetworkState, Notification, NotificationLevel, Record, SyncOutcome,
    SyncQueueItem, SyncQueueItemDraft, SyncResult,
};
