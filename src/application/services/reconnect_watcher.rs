use super::sync_service::SyncService;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Drains the queue after every offline to online transition. Transitions that land
/// while a drain is running are picked up as soon as it finishes.
pub fn spawn_reconnect_watcher(sync: Arc<SyncService>) -> JoinHandle<()> {
    let mut rx = sync.network().subscribe();
    // read before spawning so an early reconnect is not taken as the baseline
    let mut seen = rx.borrow_and_update().reconnects;

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let (reconnects, online) = {
                let state = rx.borrow_and_update();
                (state.reconnects, state.is_online)
            };
            if reconnects == seen {
                continue;
            }
            seen = reconnects;
            if !online || !sync.auto_sync() {
                continue;
            }

            tracing::info!(target: "sync::reconnect", reconnects, "connection restored, draining queue");
            match sync.process_after_reconnect().await {
                Ok(outcome) => {
                    tracing::debug!(target: "sync::reconnect", ?outcome, "reconnect drain finished");
                }
                Err(err) => {
                    tracing::warn!(target: "sync::reconnect", error = %err, "reconnect drain failed");
                }
            }
        }
        tracing::debug!(target: "sync::reconnect", "network monitor gone, watcher stopping");
    })
}
