//! Typed views over the six synced collections.
//!
//! Each entity carries only its own columns; identity, account scope and sync
//! bookkeeping live on [`Record`](crate::domain::entities::offline::Record).

pub mod expense;
pub mod farm;
pub mod feeding_log;
pub mod material_log;
pub mod stock;
pub mod tank;

pub use expense::Expense;
pub use farm::Farm;
pub use feeding_log::FeedingLog;
pub use material_log::{MaterialAction, MaterialLog};
pub use stock::Stock;
pub use tank::Tank;

use crate::domain::value_objects::TableName;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Binds a record type to its collection at compile time.
pub trait FarmEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: TableName;
}

impl FarmEntity for Expense {
    const TABLE: TableName = TableName::Expenses;
}

impl FarmEntity for Farm {
    const TABLE: TableName = TableName::Farms;
}

impl FarmEntity for FeedingLog {
    const TABLE: TableName = TableName::FeedingLogs;
}

impl FarmEntity for MaterialLog {
    const TABLE: TableName = TableName::MaterialLogs;
}

impl FarmEntity for Stock {
    const TABLE: TableName = TableName::Stocks;
}

impl FarmEntity for Tank {
    const TABLE: TableName = TableName::Tanks;
}
