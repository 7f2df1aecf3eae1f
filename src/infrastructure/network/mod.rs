pub mod monitor;
pub mod probes;

pub use monitor::NetworkMonitor;
pub use probes::{ManualConnectivity, RemoteHealthProbe};
