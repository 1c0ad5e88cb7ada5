//! Completion counters kept on expert and client profiles.

use hirely_core::types::{Cents, DbId};
use serde::Serialize;
use sqlx::FromRow;

/// Counter columns of an `expert_profiles` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct ExpertCounters {
    pub user_id: DbId,
    pub completed_services: i64,
    pub total_earnings_cents: Cents,
}

/// Counter columns of a `client_profiles` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct ClientCounters {
    pub user_id: DbId,
    pub services_purchased: i64,
    pub total_spent_cents: Cents,
}
