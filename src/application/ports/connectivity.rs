use crate::domain::entities::offline::NetworkState;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

/// Reads the platform's current connectivity flag.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;

    /// Richer network information when the platform exposes it.
    fn connection_type(&self) -> Option<String> {
        None
    }
}

/// Connectivity transitions reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformSignal {
    Online,
    Offline,
    /// The app came back to the foreground or became visible again.
    Foregrounded,
    /// Native network API change event. Overrides the basic flag.
    ConnectionChanged {
        online: bool,
        connection_type: Option<String>,
    },
}

/// Sending half handed to the host so it can forward platform events.
#[derive(Debug, Clone)]
pub struct PlatformEvents {
    tx: mpsc::Sender<PlatformSignal>,
}

impl PlatformEvents {
    pub fn new(tx: mpsc::Sender<PlatformSignal>) -> Self {
        Self { tx }
    }

    /// Returns false once the monitor has shut down.
    pub async fn send(&self, signal: PlatformSignal) -> bool {
        self.tx.send(signal).await.is_ok()
    }
}

/// Read side of the network monitor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NetworkStatus {
    rx: watch::Receiver<NetworkState>,
}

impl NetworkStatus {
    pub fn new(rx: watch::Receiver<NetworkState>) -> Self {
        Self { rx }
    }

    pub fn is_online(&self) -> bool {
        self.rx.borrow().is_online
    }

    pub fn is_reconnecting(&self) -> bool {
        self.rx.borrow().is_reconnecting
    }

    pub fn snapshot(&self) -> NetworkState {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.rx.clone()
    }
}
