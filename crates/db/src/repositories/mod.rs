//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod otp_event_repo;
pub mod otp_repo;
pub mod profile_repo;
pub mod service_repo;
pub mod service_request_repo;
pub mod user_repo;

pub use otp_event_repo::OtpEventRepo;
pub use otp_repo::OtpRepo;
pub use profile_repo::ProfileRepo;
pub use service_repo::ServiceRepo;
pub use service_request_repo::ServiceRequestRepo;
pub use user_repo::UserRepo;
