pub mod database;
pub mod network;
pub mod notifications;
pub mod offline;
pub mod remote;
