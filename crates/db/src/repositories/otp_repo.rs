//! Repository for the `otp_verifications` table.

use hirely_core::status::OtpEventType;
use hirely_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::otp::OtpRecord;

/// Column list for `otp_verifications` queries.
const COLUMNS: &str = "user_id, otp_code, is_verified, created_at, last_sent_at, updated_at";

/// One verification record per user.
pub struct OtpRepo;

impl OtpRepo {
    pub async fn find(pool: &PgPool, user_id: DbId) -> Result<Option<OtpRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM otp_verifications WHERE user_id = $1");
        sqlx::query_as::<_, OtpRecord>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Store a freshly generated code, creating the record on first use.
    ///
    /// Both `created_at` and `last_sent_at` restart at `now`.
    pub async fn upsert_code(
        pool: &PgPool,
        user_id: DbId,
        code: &str,
        now: Timestamp,
    ) -> Result<OtpRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO otp_verifications (user_id, otp_code, is_verified, created_at, last_sent_at) \
             VALUES ($1, $2, false, $3, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 otp_code = EXCLUDED.otp_code, \
                 is_verified = false, \
                 created_at = EXCLUDED.created_at, \
                 last_sent_at = EXCLUDED.last_sent_at, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OtpRecord>(&query)
            .bind(user_id)
            .bind(code)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Consume the code, activate the user and mark the audit event verified.
    ///
    /// The code match is re-checked in the `UPDATE`, so two concurrent
    /// verifications of the same code cannot both succeed.
    pub async fn complete_verification(
        pool: &PgPool,
        user_id: DbId,
        code: &str,
        event_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE otp_verifications \
             SET is_verified = true, otp_code = NULL, updated_at = NOW() \
             WHERE user_id = $1 AND otp_code = $2",
        )
        .bind(user_id)
        .bind(code)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET is_active = true, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE otp_events SET event_type_id = $2 WHERE id = $1")
            .bind(event_id)
            .bind(OtpEventType::Verified.id())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
