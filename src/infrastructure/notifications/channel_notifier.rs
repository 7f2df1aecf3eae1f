use crate::application::ports::notifier::Notifier;
use crate::domain::entities::offline::Notification;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// Fans notifications out to any number of UI listeners and mirrors them into the log.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if notification.is_failure() {
            tracing::warn!(
                target: "notifications",
                table = ?notification.table,
                title = %notification.title,
                "{}",
                notification.description
            );
        } else {
            tracing::info!(
                target: "notifications",
                table = ?notification.table,
                title = %notification.title,
                "{}",
                notification.description
            );
        }
        // No listeners is fine; the log line above is the fallback.
        let _ = self.tx.send(notification);
    }
}
