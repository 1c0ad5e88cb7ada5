//! Repository for the `otp_events` audit table.

use hirely_core::status::OtpEventType;
use hirely_core::types::DbId;
use sqlx::PgPool;

use crate::models::otp::OtpEvent;

/// Column list for `otp_events` queries.
const COLUMNS: &str = "id, user_id, event_type_id, created_at";

/// Append-only audit log of OTP activity.
pub struct OtpEventRepo;

impl OtpEventRepo {
    /// Record an event.
    pub async fn append(
        pool: &PgPool,
        user_id: DbId,
        event_type: OtpEventType,
    ) -> Result<OtpEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO otp_events (user_id, event_type_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OtpEvent>(&query)
            .bind(user_id)
            .bind(event_type.id())
            .fetch_one(pool)
            .await
    }

    /// Rewrite the outcome of an event recorded before the attempt finished.
    pub async fn set_event_type(
        pool: &PgPool,
        event_id: DbId,
        event_type: OtpEventType,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE otp_events SET event_type_id = $2 WHERE id = $1")
            .bind(event_id)
            .bind(event_type.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// All events for a user, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<OtpEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM otp_events WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, OtpEvent>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
