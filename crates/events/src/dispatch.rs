//! Fire-and-forget email dispatch.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::delivery::email::EmailDelivery;
use crate::notification::{Notification, NotificationSink};

/// [`NotificationSink`] that spawns one SMTP delivery task per notification.
///
/// Delivery errors are logged from the spawned task. When called outside a
/// Tokio runtime the notification is dropped with a warning.
#[derive(Clone)]
pub struct EmailSink {
    delivery: Arc<EmailDelivery>,
}

impl EmailSink {
    pub fn new(delivery: EmailDelivery) -> Self {
        Self {
            delivery: Arc::new(delivery),
        }
    }
}

impl NotificationSink for EmailSink {
    fn send(&self, notification: Notification) {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(
                to = %notification.recipient,
                subject = %notification.subject,
                "No runtime available, notification dropped"
            );
            return;
        };

        let delivery = Arc::clone(&self.delivery);
        handle.spawn(async move {
            if let Err(e) = delivery.deliver(&notification).await {
                tracing::error!(
                    error = %e,
                    to = %notification.recipient,
                    subject = %notification.subject,
                    "Failed to deliver notification email"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::email::EmailConfig;

    fn sink() -> EmailSink {
        EmailSink::new(
            EmailDelivery::new(EmailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: 2525,
                from_address: "noreply@hirely.local".to_string(),
                smtp_user: None,
                smtp_password: None,
            })
            .unwrap(),
        )
    }

    #[test]
    fn send_without_runtime_returns() {
        sink().send(Notification::new("a@example.com", "Subject", "Body"));
    }

    #[tokio::test]
    async fn send_returns_before_delivery_finishes() {
        // Invalid recipient fails inside the spawned task, never here.
        sink().send(Notification::new("not-an-email", "Subject", "Body"));
    }
}
