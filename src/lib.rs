//! Offline-first record store and sync queue for aquaculture farm operations.
//!
//! Mutations land in a local SQLite cache first and are queued; the sync engine
//! replays the queue against the hosted table API whenever the device is online.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;

pub const DEFAULT_LOG_FILTER: &str = "info,pondkeeper=debug,pondkeeper_lib=debug,sync=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
