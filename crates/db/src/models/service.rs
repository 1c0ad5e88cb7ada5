//! Service listing model (read-only for the request lifecycle).

use hirely_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `services` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: DbId,
    pub expert_id: Option<DbId>,
    pub title: String,
    /// List price. Used as the default `agreed_price` of new requests.
    pub price_cents: Option<Cents>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a service listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateService {
    pub expert_id: Option<DbId>,
    pub title: String,
    pub price_cents: Option<Cents>,
}
