use hirely_core::status::{OtpEventType, RequestStatus};
use sqlx::PgPool;

/// Connect, migrate and verify the lookup tables match the enums.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    hirely_db::health_check(&pool).await.unwrap();

    for status in RequestStatus::ALL {
        let (name,): (String,) =
            sqlx::query_as("SELECT name FROM service_request_statuses WHERE id = $1")
                .bind(status.id())
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|e| panic!("{status} lookup failed: {e}"));
        assert_eq!(name, status.name());
    }

    for event_type in OtpEventType::ALL {
        let (name,): (String,) = sqlx::query_as("SELECT name FROM otp_event_types WHERE id = $1")
            .bind(event_type.id())
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{event_type} lookup failed: {e}"));
        assert_eq!(name, event_type.name());
    }
}
