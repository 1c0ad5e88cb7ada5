//! Repository for `expert_profiles` and `client_profiles` counters.

use hirely_core::types::{Cents, DbId};
use sqlx::PgPool;

use crate::models::profile::{ClientCounters, ExpertCounters};

/// Maintains completion counters. Rows are created on first completion.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Credit a completed request to the expert and the client in one transaction.
    pub async fn record_completion(
        pool: &PgPool,
        expert_id: DbId,
        client_id: DbId,
        price_cents: Cents,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO expert_profiles (user_id, completed_services, total_earnings_cents) \
             VALUES ($1, 1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 completed_services = expert_profiles.completed_services + 1, \
                 total_earnings_cents = expert_profiles.total_earnings_cents + EXCLUDED.total_earnings_cents, \
                 updated_at = NOW()",
        )
        .bind(expert_id)
        .bind(price_cents)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO client_profiles (user_id, services_purchased, total_spent_cents) \
             VALUES ($1, 1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 services_purchased = client_profiles.services_purchased + 1, \
                 total_spent_cents = client_profiles.total_spent_cents + EXCLUDED.total_spent_cents, \
                 updated_at = NOW()",
        )
        .bind(client_id)
        .bind(price_cents)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// Expert counters; zeroes when the expert has no profile row yet.
    pub async fn expert_counters(pool: &PgPool, user_id: DbId) -> Result<ExpertCounters, sqlx::Error> {
        let row = sqlx::query_as::<_, ExpertCounters>(
            "SELECT user_id, completed_services, total_earnings_cents \
             FROM expert_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.unwrap_or(ExpertCounters {
            user_id,
            ..ExpertCounters::default()
        }))
    }

    /// Client counters; zeroes when the client has no profile row yet.
    pub async fn client_counters(pool: &PgPool, user_id: DbId) -> Result<ClientCounters, sqlx::Error> {
        let row = sqlx::query_as::<_, ClientCounters>(
            "SELECT user_id, services_purchased, total_spent_cents \
             FROM client_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.unwrap_or(ClientCounters {
            user_id,
            ..ClientCounters::default()
        }))
    }
}
