//! Repository for the `service_requests` table.
//!
//! Status changes go through [`ServiceRequestRepo::apply_transition`], which
//! locks the row, runs the transition guard and writes back in one
//! transaction. No other method writes `status_id`.

use hirely_core::request_lifecycle::{Transition, DASHBOARD_ACTIVE_STATUSES};
use hirely_core::stats::{RequestStats, StatsSummary};
use hirely_core::status::{RequestStatus, StatusId};
use hirely_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::service_request::{NewServiceRequest, RequestFilter, ServiceRequest};
use crate::store::TransitionOutcome;

/// Column list for `service_requests` queries.
const COLUMNS: &str = "\
    id, client_id, expert_id, service_id, agreed_price_cents, end_date, start_date, \
    status_id, expert_response_reason, cancellation_reason, \
    expert_completed, expert_completion_date, client_confirmed, confirmation_date, \
    has_dispute, created_at, updated_at";

/// Shared `WHERE` clause for [`RequestFilter`]; binds `$1..$3`.
const FILTER_CLAUSE: &str = "\
    ($1::BIGINT IS NULL OR client_id = $1) \
    AND ($2::BIGINT IS NULL OR expert_id = $2) \
    AND ($3::SMALLINT IS NULL OR status_id = $3)";

/// Provides persistence for service requests.
pub struct ServiceRequestRepo;

impl ServiceRequestRepo {
    /// Insert a `pending` request unless an active one already exists for
    /// the same client, expert and service.
    ///
    /// Relies on the partial unique index `uq_service_requests_active_triple`;
    /// its predicate must match the `ON CONFLICT ... WHERE` below. Returns
    /// `None` on conflict.
    pub async fn create_if_no_active(
        pool: &PgPool,
        input: &NewServiceRequest,
    ) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_requests \
                 (client_id, expert_id, service_id, agreed_price_cents, end_date, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (client_id, expert_id, service_id) \
                 WHERE status_id IN (1, 2, 3, 4) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(input.client_id)
            .bind(input.expert_id)
            .bind(input.service_id)
            .bind(input.agreed_price_cents)
            .bind(input.end_date)
            .bind(RequestStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ServiceRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_requests WHERE id = $1");
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &RequestFilter,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_requests \
             WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(filter.client_id)
            .bind(filter.expert_id)
            .bind(filter.status.map(RequestStatus::id))
            .fetch_all(pool)
            .await
    }

    /// Lock the row, check the guard and persist the transition.
    ///
    /// A concurrent caller blocks on `FOR UPDATE` and then sees the
    /// committed status, so at most one of two racing transitions applies.
    pub async fn apply_transition(
        pool: &PgPool,
        id: DbId,
        transition: &Transition,
        now: Timestamp,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM service_requests WHERE id = $1 FOR UPDATE");
        let Some(mut request) = sqlx::query_as::<_, ServiceRequest>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(TransitionOutcome::NotFound);
        };

        let previous = request.status;
        if request.apply(transition, now).is_err() {
            tx.rollback().await?;
            return Ok(TransitionOutcome::InvalidState { current: previous });
        }

        let update = format!(
            "UPDATE service_requests SET \
                 status_id = $2, \
                 expert_response_reason = $3, \
                 cancellation_reason = $4, \
                 start_date = $5, \
                 expert_completed = $6, \
                 expert_completion_date = $7, \
                 client_confirmed = $8, \
                 confirmation_date = $9, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ServiceRequest>(&update)
            .bind(id)
            .bind(request.status.id())
            .bind(&request.expert_response_reason)
            .bind(&request.cancellation_reason)
            .bind(request.start_date)
            .bind(request.expert_completed)
            .bind(request.expert_completion_date)
            .bind(request.client_confirmed)
            .bind(request.confirmation_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TransitionOutcome::Applied {
            previous,
            request: updated,
        })
    }

    /// Requests eligible for automatic confirmation, oldest completion first.
    pub async fn auto_confirm_candidates(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_requests \
             WHERE status_id = $1 \
               AND expert_completed = true \
               AND client_confirmed = false \
               AND expert_completion_date <= $2 \
             ORDER BY expert_completion_date ASC, id ASC"
        );
        sqlx::query_as::<_, ServiceRequest>(&query)
            .bind(RequestStatus::AwaitingConfirmation.id())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Aggregate counts and the newest rows from a single snapshot.
    pub async fn stats(
        pool: &PgPool,
        filter: &RequestFilter,
        recent_limit: usize,
    ) -> Result<RequestStats, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let active: Vec<StatusId> = DASHBOARD_ACTIVE_STATUSES.iter().map(|s| s.id()).collect();
        let aggregate = format!(
            "SELECT \
                 COUNT(*), \
                 COUNT(*) FILTER (WHERE status_id = ANY($4)), \
                 COUNT(*) FILTER (WHERE status_id = $5), \
                 COALESCE(SUM(agreed_price_cents) FILTER (WHERE status_id = $5), 0)::BIGINT \
             FROM service_requests \
             WHERE {FILTER_CLAUSE}"
        );
        let (total, active_count, completed, spent): (i64, i64, i64, i64) =
            sqlx::query_as(&aggregate)
                .bind(filter.client_id)
                .bind(filter.expert_id)
                .bind(filter.status.map(RequestStatus::id))
                .bind(&active)
                .bind(RequestStatus::Completed.id())
                .fetch_one(&mut *tx)
                .await?;

        let recent_query = format!(
            "SELECT {COLUMNS} FROM service_requests \
             WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4"
        );
        let recent = sqlx::query_as::<_, ServiceRequest>(&recent_query)
            .bind(filter.client_id)
            .bind(filter.expert_id)
            .bind(filter.status.map(RequestStatus::id))
            .bind(i64::try_from(recent_limit).unwrap_or(i64::MAX))
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(RequestStats {
            summary: StatsSummary {
                total_requests: total,
                active_requests: active_count,
                completed_requests: completed,
                total_spent_cents: spent,
            },
            recent_requests: recent.iter().map(ServiceRequest::to_recent).collect(),
        })
    }
}
