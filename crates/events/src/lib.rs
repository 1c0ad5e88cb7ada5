//! Hirely notification infrastructure.
//!
//! - [`NotificationSink`]: the fire-and-forget seam the lifecycle emits
//!   through. `send` never blocks and never reports failure.
//! - [`LogSink`]: writes notifications to the tracing log only.
//! - [`delivery::email`]: SMTP delivery via `lettre`.
//! - [`EmailSink`]: spawns one delivery task per notification.

pub mod delivery;
pub mod dispatch;
pub mod notification;

use std::sync::Arc;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use dispatch::EmailSink;
pub use notification::{LogSink, Notification, NotificationSink};

/// Build the sink selected by the environment.
///
/// Uses SMTP when `SMTP_HOST` is set and the transport can be built,
/// otherwise falls back to [`LogSink`].
pub fn sink_from_env() -> Arc<dyn NotificationSink> {
    let Some(config) = EmailConfig::from_env() else {
        tracing::info!("SMTP_HOST not set, notifications are logged only");
        return Arc::new(LogSink);
    };

    match EmailDelivery::new(config) {
        Ok(delivery) => Arc::new(EmailSink::new(delivery)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build SMTP transport, notifications are logged only");
            Arc::new(LogSink)
        }
    }
}
