use chrono::Duration;
use hirely_core::otp::{DEFAULT_EXPIRY_MINUTES, DEFAULT_RESEND_COOLDOWN_MINUTES};
use hirely_core::request_lifecycle::AUTO_CONFIRM_AFTER_HOURS;

/// Upper bound for the OTP timings, one week.
pub const MAX_OTP_MINUTES: i64 = 7 * 24 * 60;
/// Upper bound for the auto-confirm window, one year.
pub const MAX_AUTO_CONFIRM_HOURS: i64 = 365 * 24;

/// Timing rules for the OTP and request lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Minutes an OTP stays valid after generation.
    pub otp_expiry_minutes: i64,
    /// Minimum minutes between two OTP sends.
    pub otp_resend_cooldown_minutes: i64,
    /// Hours after expert completion before the sweeper confirms.
    pub auto_confirm_after_hours: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            otp_expiry_minutes: DEFAULT_EXPIRY_MINUTES,
            otp_resend_cooldown_minutes: DEFAULT_RESEND_COOLDOWN_MINUTES,
            auto_confirm_after_hours: AUTO_CONFIRM_AFTER_HOURS,
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `OTP_EXPIRY_MINUTES`          | `10`    |
    /// | `OTP_RESEND_COOLDOWN_MINUTES` | `2`     |
    /// | `AUTO_CONFIRM_AFTER_HOURS`    | `24`    |
    ///
    /// Each value must be positive. OTP timings are capped at
    /// [`MAX_OTP_MINUTES`], the auto-confirm window at
    /// [`MAX_AUTO_CONFIRM_HOURS`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            otp_expiry_minutes: env_timing(
                "OTP_EXPIRY_MINUTES",
                defaults.otp_expiry_minutes,
                MAX_OTP_MINUTES,
            ),
            otp_resend_cooldown_minutes: env_timing(
                "OTP_RESEND_COOLDOWN_MINUTES",
                defaults.otp_resend_cooldown_minutes,
                MAX_OTP_MINUTES,
            ),
            auto_confirm_after_hours: env_timing(
                "AUTO_CONFIRM_AFTER_HOURS",
                defaults.auto_confirm_after_hours,
                MAX_AUTO_CONFIRM_HOURS,
            ),
        }
    }

    pub fn otp_expiry(&self) -> Duration {
        Duration::minutes(self.otp_expiry_minutes)
    }

    pub fn otp_resend_cooldown(&self) -> Duration {
        Duration::minutes(self.otp_resend_cooldown_minutes)
    }
}

fn env_timing(name: &str, default: i64, max: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) => parse_timing(name, &raw, max),
        Err(_) => default,
    }
}

fn parse_timing(name: &str, raw: &str, max: i64) -> i64 {
    let value: i64 = raw
        .trim()
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid integer"));
    assert!(
        (1..=max).contains(&value),
        "{name} must be between 1 and {max}, got {value}"
    );
    value
}
