//! Desktop notifications through the platform notification service.

use notify_rust::Notification;
use replay_saver_core::NotificationSink;
use tracing::{debug, warn};

const APP_NAME: &str = "Replay Saver";

/// Shows each (title, message) pair as a desktop toast.
///
/// Delivery runs on a blocking thread when a tokio runtime is available, so
/// a slow notification daemon never delays the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    /// Create a notifier.
    pub fn new() -> Self {
        Self
    }

    /// Show a notification on the current thread.
    pub fn notify_blocking(&self, title: &str, message: &str) {
        show(title, message);
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let (title, message) = (title.to_string(), message.to_string());

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let _ = handle.spawn_blocking(move || show(&title, &message));
            }
            Err(_) => show(&title, &message),
        }
    }
}

fn show(title: &str, message: &str) {
    match Notification::new()
        .appname(APP_NAME)
        .summary(title)
        .body(message)
        .show()
    {
        Ok(_) => debug!(title, "Notification shown"),
        Err(e) => warn!(error = %e, title, "Failed to show notification"),
    }
}
