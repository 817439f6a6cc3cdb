/// Receives user-facing (title, message) pairs.
///
/// Implementations are fire-and-forget: they must not block the caller for
/// long and must swallow their own delivery failures.
pub trait NotificationSink: Send + Sync {
    /// Show a notification.
    fn notify(&self, title: &str, message: &str);
}
