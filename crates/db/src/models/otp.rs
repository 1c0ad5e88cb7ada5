//! OTP verification record and audit event models.

use hirely_core::otp;
use hirely_core::status::OtpEventType;
use hirely_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `otp_verifications` table. One per user.
///
/// `otp_code` is `None` once the code has been consumed; a verified record
/// never holds a code.
#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub user_id: DbId,
    pub otp_code: Option<String>,
    pub is_verified: bool,
    /// Reset on every generation; expiry is measured from here.
    pub created_at: Timestamp,
    /// Reset on every generation; the resend cooldown is measured from here.
    pub last_sent_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl OtpRecord {
    /// Whether the code has outlived `expiry` at `now`.
    pub fn is_expired(&self, now: Timestamp, expiry: chrono::Duration) -> bool {
        otp::is_expired(self.created_at, now, expiry)
    }
}

/// A row from the `otp_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OtpEvent {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(rename = "event_type_id", try_from = "i16")]
    pub event_type: OtpEventType,
    pub created_at: Timestamp,
}
