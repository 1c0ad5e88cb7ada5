//! Notification envelope and sink trait.

use serde::Serialize;

/// A plain-text message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Best-effort delivery channel.
///
/// Implementations must return promptly: slow work is handed off, and any
/// failure is logged by the implementation rather than returned.
pub trait NotificationSink: Send + Sync {
    fn send(&self, notification: Notification);
}

/// Sink that only logs. Used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(&self, notification: Notification) {
        tracing::info!(
            to = %notification.recipient,
            subject = %notification.subject,
            "Notification (log only)"
        );
    }
}
