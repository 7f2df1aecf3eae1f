mod mappers;
mod rows;
pub mod sqlite_queue;
pub mod sqlite_store;

pub use sqlite_queue::SqliteSyncQueue;
pub use sqlite_store::SqliteLocalStore;
