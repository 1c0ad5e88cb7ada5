//! One-time password rules: code generation, expiry and resend cooldown.
//!
//! The functions here are pure; persistence and the audit log live in the
//! store, and orchestration in the lifecycle crate.

use chrono::Duration;
use rand::Rng;

use crate::types::Timestamp;

/// Number of digits in an OTP code.
pub const OTP_LENGTH: usize = 6;

/// Exclusive upper bound of the numeric code space (`000000..=999999`).
const OTP_SPACE: u32 = 1_000_000;

/// Default minutes before an issued code stops being accepted.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 10;

/// Default minutes a user must wait between two sends.
pub const DEFAULT_RESEND_COOLDOWN_MINUTES: i64 = 2;

/// Draw a fresh code uniformly over the full 6-digit range.
///
/// Leading zeros are kept, so `"004211"` is a valid code.
pub fn generate_code() -> String {
    generate_code_with(&mut rand::rng())
}

/// Draw a code from the given RNG.
pub fn generate_code_with<R: Rng>(rng: &mut R) -> String {
    let n = rng.random_range(0..OTP_SPACE);
    format!("{n:0width$}", width = OTP_LENGTH)
}

/// Whether a code generated at `created_at` is no longer valid at `now`.
pub fn is_expired(created_at: Timestamp, now: Timestamp, expiry: Duration) -> bool {
    now > created_at + expiry
}

/// Whether enough time has passed since `last_sent_at` to send again.
///
/// A record that was never sent has no cooldown.
pub fn cooldown_elapsed(last_sent_at: Option<Timestamp>, now: Timestamp, cooldown: Duration) -> bool {
    match last_sent_at {
        Some(sent) => now - sent >= cooldown,
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Verification outcome
// ---------------------------------------------------------------------------

/// Why a verification attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpFailure {
    /// No record, or the code was already consumed.
    NotFound,
    /// The code outlived its expiry window.
    Expired,
    /// The submitted code does not match.
    Mismatch,
}

impl OtpFailure {
    pub fn message(self) -> &'static str {
        match self {
            OtpFailure::NotFound => "OTP not found. Please request a new OTP.",
            OtpFailure::Expired => "OTP has expired.",
            OtpFailure::Mismatch => "Invalid OTP.",
        }
    }
}

/// Result of a verification attempt.
///
/// Callers branch on [`is_success`](Self::is_success); the message is for
/// display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerification {
    Verified,
    Failed(OtpFailure),
}

impl OtpVerification {
    pub fn is_success(self) -> bool {
        matches!(self, OtpVerification::Verified)
    }

    pub fn message(self) -> &'static str {
        match self {
            OtpVerification::Verified => "OTP verified successfully.",
            OtpVerification::Failed(reason) => reason.message(),
        }
    }

    /// The `(success, message)` pair exposed to the HTTP layer.
    pub fn into_pair(self) -> (bool, String) {
        (self.is_success(), self.message().to_string())
    }
}

/// Check a submitted code against the stored one.
///
/// `stored_code` is `None` once a code has been consumed.
pub fn check_code(
    stored_code: Option<&str>,
    submitted: &str,
    created_at: Timestamp,
    now: Timestamp,
    expiry: Duration,
) -> OtpVerification {
    let Some(stored) = stored_code else {
        return OtpVerification::Failed(OtpFailure::NotFound);
    };
    if is_expired(created_at, now, expiry) {
        return OtpVerification::Failed(OtpFailure::Expired);
    }
    if stored != submitted {
        return OtpVerification::Failed(OtpFailure::Mismatch);
    }
    OtpVerification::Verified
}
