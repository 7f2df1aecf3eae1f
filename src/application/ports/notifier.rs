use crate::domain::entities::offline::Notification;

/// Sink for user-facing toasts.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
