//! Row models and DTOs.
//!
//! Rows derive `FromRow`; status columns decode into the `hirely_core`
//! status enums via `#[sqlx(try_from = "i16")]`.

pub mod otp;
pub mod profile;
pub mod service;
pub mod service_request;
pub mod user;
