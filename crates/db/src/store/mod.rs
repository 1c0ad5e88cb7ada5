//! Store traits consumed by the lifecycle crate.
//!
//! Entities carry no persistence behaviour; every read and write goes
//! through these traits. Two implementations ship with this crate:
//!
//! - [`PgStore`](postgres::PgStore) delegates to the Postgres repositories.
//! - [`MemoryStore`](memory::MemoryStore) keeps everything behind one mutex,
//!   for local runs and tests.
//!
//! Guarded mutations (`apply_transition`, `create_if_no_active`,
//! `complete_verification`) are atomic in both implementations: the guard
//! check and the write cannot interleave with another mutator.

use async_trait::async_trait;
use hirely_core::request_lifecycle::Transition;
use hirely_core::stats::RequestStats;
use hirely_core::status::{OtpEventType, RequestStatus};
use hirely_core::types::{Cents, DbId, Timestamp};

use crate::models::otp::{OtpEvent, OtpRecord};
use crate::models::profile::{ClientCounters, ExpertCounters};
use crate::models::service::Service;
use crate::models::service_request::{NewServiceRequest, RequestFilter, ServiceRequest};
use crate::models::user::User;

pub mod memory;
pub mod postgres;

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Persistence failure. Domain outcomes (guard failures, duplicates) are
/// returned as values, never as this error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a guarded status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The guard passed and the new state was written.
    Applied {
        previous: RequestStatus,
        request: ServiceRequest,
    },
    /// No request with that id.
    NotFound,
    /// The request is not in a status the transition may start from.
    InvalidState { current: RequestStatus },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Contact details of users referenced by OTP records and requests.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: DbId) -> Result<Option<User>, StoreError>;
}

/// One OTP record per user.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn find_otp(&self, user_id: DbId) -> Result<Option<OtpRecord>, StoreError>;

    /// Create the record if absent, otherwise overwrite the code.
    ///
    /// Resets `created_at` and `last_sent_at` to `now` and clears
    /// `is_verified`, since a verified record may not hold a code.
    async fn upsert_code(
        &self,
        user_id: DbId,
        code: &str,
        now: Timestamp,
    ) -> Result<OtpRecord, StoreError>;

    /// Consume `code` and activate the user in one atomic step.
    ///
    /// Marks the record verified, clears the code, sets `users.is_active`
    /// and promotes `event_id` to `verified`. Returns `false` (and changes
    /// nothing) if the stored code is no longer `code`.
    async fn complete_verification(
        &self,
        user_id: DbId,
        code: &str,
        event_id: DbId,
    ) -> Result<bool, StoreError>;
}

/// Append-only OTP audit trail.
#[async_trait]
pub trait OtpEventLog: Send + Sync {
    async fn append_event(
        &self,
        user_id: DbId,
        event_type: OtpEventType,
    ) -> Result<OtpEvent, StoreError>;

    /// Rewrite the type of an existing event. Returns `false` if it does not exist.
    async fn set_event_type(
        &self,
        event_id: DbId,
        event_type: OtpEventType,
    ) -> Result<bool, StoreError>;

    /// All events for a user, oldest first.
    async fn list_events(&self, user_id: DbId) -> Result<Vec<OtpEvent>, StoreError>;
}

/// Read access to service listings.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn find_service(&self, service_id: DbId) -> Result<Option<Service>, StoreError>;
}

/// Completion counters on expert and client profiles.
#[async_trait]
pub trait ProfileLedger: Send + Sync {
    /// Credit one completed request to both parties.
    async fn record_completion(
        &self,
        expert_id: DbId,
        client_id: DbId,
        price_cents: Cents,
    ) -> Result<(), StoreError>;

    async fn expert_counters(&self, user_id: DbId) -> Result<ExpertCounters, StoreError>;

    async fn client_counters(&self, user_id: DbId) -> Result<ClientCounters, StoreError>;
}

/// Service request persistence.
#[async_trait]
pub trait ServiceRequestStore: Send + Sync {
    /// Insert a `pending` request unless an active one exists for the same
    /// (client, expert, service). Returns `None` on duplicate.
    async fn create_if_no_active(
        &self,
        input: &NewServiceRequest,
    ) -> Result<Option<ServiceRequest>, StoreError>;

    async fn find_request(&self, id: DbId) -> Result<Option<ServiceRequest>, StoreError>;

    /// Requests matching `filter`, newest first.
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, StoreError>;

    /// Check the guard and write the new state atomically.
    async fn apply_transition(
        &self,
        id: DbId,
        transition: &Transition,
        now: Timestamp,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Requests awaiting confirmation whose expert completion is at or
    /// before `cutoff`, oldest completion first.
    async fn auto_confirm_candidates(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<ServiceRequest>, StoreError>;

    /// Summary and recent rows computed from one consistent snapshot.
    async fn request_stats(
        &self,
        filter: &RequestFilter,
        recent_limit: usize,
    ) -> Result<RequestStats, StoreError>;
}

/// Everything the lifecycle services need from persistence.
pub trait MarketplaceStore:
    UserDirectory + OtpStore + OtpEventLog + ServiceCatalog + ProfileLedger + ServiceRequestStore
{
}

impl<T> MarketplaceStore for T where
    T: UserDirectory + OtpStore + OtpEventLog + ServiceCatalog + ProfileLedger + ServiceRequestStore
{
}
