use crate::application::ports::connectivity::{
    ConnectivityProbe, NetworkStatus, PlatformEvents, PlatformSignal,
};
use crate::domain::entities::offline::NetworkState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const SIGNAL_BUFFER: usize = 32;

/// Event-driven connectivity tracker. One task per process; no polling.
pub struct NetworkMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    probe_delay: Duration,
    state: watch::Sender<NetworkState>,
    probe_at: Option<Instant>,
}

impl NetworkMonitor {
    /// Channel the host uses to forward platform connectivity events.
    pub fn platform_channel() -> (PlatformEvents, mpsc::Receiver<PlatformSignal>) {
        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        (PlatformEvents::new(tx), rx)
    }

    /// Reads the initial flag and spawns the event loop. The loop ends when every
    /// `PlatformEvents` sender is dropped.
    pub async fn start(
        probe: Arc<dyn ConnectivityProbe>,
        probe_delay: Duration,
        signals: mpsc::Receiver<PlatformSignal>,
    ) -> (NetworkStatus, JoinHandle<()>) {
        let initial = NetworkState::initial(probe.is_online().await, probe.connection_type());
        tracing::info!(
            target: "network::monitor",
            online = initial.is_online,
            connection_type = ?initial.connection_type,
            "network monitor started"
        );

        let (state, rx) = watch::channel(initial);
        let monitor = Self {
            probe,
            probe_delay,
            state,
            probe_at: None,
        };
        let handle = tokio::spawn(monitor.run(signals));
        (NetworkStatus::new(rx), handle)
    }

    async fn run(mut self, mut signals: mpsc::Receiver<PlatformSignal>) {
        loop {
            let deadline = self.probe_at;
            tokio::select! {
                signal = signals.recv() => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.probe_at = None;
                    self.run_probe().await;
                }
            }
        }
        tracing::debug!(target: "network::monitor", "platform event channel closed");
    }

    fn handle_signal(&mut self, signal: PlatformSignal) {
        match signal {
            PlatformSignal::Online => {
                self.probe_at = None;
                self.apply(true, None);
            }
            PlatformSignal::Offline => {
                self.probe_at = None;
                self.apply(false, None);
            }
            PlatformSignal::ConnectionChanged {
                online,
                connection_type,
            } => {
                self.probe_at = None;
                self.apply(online, connection_type);
            }
            PlatformSignal::Foregrounded => {
                if self.state.borrow().is_online || self.probe_at.is_some() {
                    return;
                }
                self.state.send_modify(|state| state.is_reconnecting = true);
                self.probe_at = Some(Instant::now() + self.probe_delay);
                tracing::debug!(target: "network::monitor", "foregrounded while offline, probing");
            }
        }
    }

    async fn run_probe(&mut self) {
        let online = self.probe.is_online().await;
        let connection_type = self.probe.connection_type();
        self.apply(online, connection_type);
    }

    fn apply(&self, online: bool, connection_type: Option<String>) {
        let was_online = self.state.borrow().is_online;
        self.state.send_modify(|state| {
            state.apply_online(online);
            if connection_type.is_some() {
                state.connection_type = connection_type;
            }
        });

        if was_online != online {
            tracing::info!(target: "network::monitor", online, "connectivity changed");
        }
    }
}
