//! Repository for the `services` table.

use hirely_core::types::DbId;
use sqlx::PgPool;

use crate::models::service::{CreateService, Service};

/// Column list for `services` queries.
const COLUMNS: &str = "id, expert_id, title, price_cents, is_active, created_at, updated_at";

/// Provides read and create operations for service listings.
pub struct ServiceRepo;

impl ServiceRepo {
    pub async fn create(pool: &PgPool, input: &CreateService) -> Result<Service, sqlx::Error> {
        let query = format!(
            "INSERT INTO services (expert_id, title, price_cents) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(input.expert_id)
            .bind(&input.title)
            .bind(input.price_cents)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
