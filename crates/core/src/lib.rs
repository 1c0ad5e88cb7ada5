//! Domain rules for the Hirely marketplace.
//!
//! Pure logic only: no I/O, no database types. Shared by the `db`,
//! `lifecycle` and `worker` crates.

pub mod error;
pub mod otp;
pub mod request_lifecycle;
pub mod stats;
pub mod status;
pub mod types;
