//! User-facing notifications as data.
//!
//! Services report outcomes by handing a [`Notification`] to a [`Notifier`];
//! presentation (toasts, colours, positioning) belongs to whoever consumes
//! them.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::client::ClientError;

const SUCCESS_AUTO_CLOSE: Duration = Duration::from_millis(5000);
const DEFAULT_AUTO_CLOSE: Duration = Duration::from_millis(7000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Error,
    Info,
    Success,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::Success => "success",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub auto_close: Duration,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        let auto_close = match level {
            NotificationLevel::Success => SUCCESS_AUTO_CLOSE,
            _ => DEFAULT_AUTO_CLOSE,
        };
        Self {
            level,
            title: title.into(),
            message: message.into(),
            auto_close,
            raised_at: Utc::now(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, message)
    }

    /// Error notification for a failed backend call.
    pub fn from_client_error(title: impl Into<String>, err: &ClientError) -> Self {
        Self::error(title, err.user_message())
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Report a failed call unless it was cancelled; cancelled work is silent.
pub fn notify_failure(notifier: &dyn Notifier, title: &str, err: &ClientError) {
    if err.is_cancelled() {
        return;
    }
    notifier.notify(Notification::from_client_error(title, err));
}

/// Notifier that keeps every notification in order and mirrors each into
/// `tracing`.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => error!(
                title = %notification.title,
                message = %notification.message,
                "notification"
            ),
            level => info!(
                %level,
                title = %notification.title,
                message = %notification.message,
                "notification"
            ),
        }
        self.entries.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_close_by_level() {
        assert_eq!(
            Notification::success("Updated", "ok").auto_close,
            Duration::from_secs(5)
        );
        assert_eq!(
            Notification::error("Failed", "no").auto_close,
            Duration::from_secs(7)
        );
        assert_eq!(
            Notification::info("Note", "fyi").auto_close,
            Duration::from_secs(7)
        );
    }

    #[test]
    fn test_cancelled_failures_are_silent() {
        let log = NotificationLog::new();
        notify_failure(&log, "Load failed", &ClientError::cancelled());
        assert!(log.is_empty());

        notify_failure(&log, "Load failed", &ClientError::network("refused"));
        assert_eq!(log.errors().len(), 1);
        assert_eq!(log.last().unwrap().message, "Network error (refused)");
    }
}
