pub mod connectivity;
pub mod local_store;
pub mod notifier;
pub mod remote_store;

pub use connectivity::{ConnectivityProbe, NetworkStatus, PlatformEvents, PlatformSignal};
pub use local_store::{CommittedMutation, LocalMutation, LocalStore, SyncQueueStore};
pub use notifier::Notifier;
pub use remote_store::RemoteStore;
