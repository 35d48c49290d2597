use tracing::{info, warn};

/// Fire-and-forget sink for user-facing messages (toasts, status lines).
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(text = message, "Notification");
    }

    fn error(&self, message: &str) {
        warn!(text = message, "Error notification");
    }
}
