pub mod network_state;
pub mod notification;
pub mod record;
pub mod sync_queue_item;
pub mod sync_result;

pub use network_state::NetworkState;
pub use notification::{Notification, NotificationLevel};
pub use record::Record;
pub use sync_queue_item::{SyncQueueItem, SyncQueueItemDraft};
pub use sync_result::{HydrationReport, SkipReason, SyncOutcome, SyncResult, TableHydration};
