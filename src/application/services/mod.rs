pub mod loading_tracker;
pub mod offline_repository;
pub mod reconnect_watcher;
pub mod sync_service;

pub use loading_tracker::{LoadingGuard, LoadingTracker, INITIAL_LOAD, SYNC};
pub use offline_repository::{LiveQuery, OfflineRepository};
pub use reconnect_watcher::spawn_reconnect_watcher;
pub use sync_service::{RetryPolicy, SyncService, SyncServiceStatus};
