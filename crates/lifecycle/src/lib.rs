//! Orchestration of the Hirely request and verification lifecycles.
//!
//! Each service wraps a [`MarketplaceStore`](hirely_db::MarketplaceStore)
//! and runs the side effects of a committed change in a fixed order:
//! notify, release payment, update profile counters. Side-effect failures
//! are logged and never undo the change.
//!
//! - [`OtpService`]: OTP issue, verification and resend cooldown.
//! - [`RequestService`]: service request creation and status transitions.
//! - [`AutoConfirmSweeper`]: periodic confirmation of stale completions.
//! - [`StatsService`]: dashboard aggregates and profile counters.

pub mod auto_confirm;
pub mod config;
pub mod error;
pub mod messages;
pub mod otp;
pub mod payment;
pub mod requests;
pub mod stats;

pub use auto_confirm::{AutoConfirmReport, AutoConfirmSweeper};
pub use config::LifecycleConfig;
pub use error::LifecycleError;
pub use otp::OtpService;
pub use payment::{EscrowStub, PaymentError, PaymentRelease};
pub use requests::RequestService;
pub use stats::StatsService;
