//! Service request entity, input DTOs and the in-memory transition step.

use chrono::NaiveDate;
use hirely_core::error::CoreError;
use hirely_core::request_lifecycle::Transition;
use hirely_core::stats::RecentRequest;
use hirely_core::status::RequestStatus;
use hirely_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `service_requests` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ServiceRequest {
    pub id: DbId,
    pub client_id: DbId,
    pub expert_id: DbId,
    pub service_id: DbId,
    /// Fixed at creation; never updated afterwards.
    pub agreed_price_cents: Cents,
    /// Expected completion date provided by the client.
    pub end_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: RequestStatus,
    pub expert_response_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub expert_completed: bool,
    pub expert_completion_date: Option<Timestamp>,
    pub client_confirmed: bool,
    pub confirmation_date: Option<Timestamp>,
    pub has_dispute: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ServiceRequest {
    /// Apply `transition` to this record, enforcing the transition table.
    ///
    /// Leaves the record untouched when the guard fails. Stores call this on
    /// a row they hold locked, then write the mutable columns back.
    pub fn apply(&mut self, transition: &Transition, now: Timestamp) -> Result<(), CoreError> {
        transition.check(self.status)?;

        match transition {
            Transition::Accept { reason } | Transition::Reject { reason } => {
                if reason.is_some() {
                    self.expert_response_reason = reason.clone();
                }
            }
            Transition::Start => {
                self.start_date = Some(now.date_naive());
            }
            Transition::MarkExpertCompleted => {
                self.expert_completed = true;
                self.expert_completion_date = Some(now);
            }
            Transition::Confirm => {
                self.client_confirmed = true;
                self.confirmation_date = Some(now);
            }
            Transition::Cancel { reason } => {
                self.cancellation_reason = reason.clone();
            }
        }

        self.status = transition.target();
        self.updated_at = now;
        Ok(())
    }

    /// Compact projection used by dashboards.
    pub fn to_recent(&self) -> RecentRequest {
        RecentRequest {
            id: self.id,
            status: self.status,
            agreed_price_cents: self.agreed_price_cents,
            created_at: self.created_at,
        }
    }
}

/// Client-supplied input for a new request.
///
/// `agreed_price_cents` defaults to the service's list price when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub client_id: DbId,
    pub expert_id: DbId,
    pub service_id: DbId,
    pub agreed_price_cents: Option<Cents>,
    pub end_date: NaiveDate,
}

/// Fully resolved insert, with the price already defaulted.
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub client_id: DbId,
    pub expert_id: DbId,
    pub service_id: DbId,
    pub agreed_price_cents: Cents,
    pub end_date: NaiveDate,
}

/// Optional filters for listing and aggregating requests. Unset fields match all.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RequestFilter {
    pub client_id: Option<DbId>,
    pub expert_id: Option<DbId>,
    pub status: Option<RequestStatus>,
}

impl RequestFilter {
    pub fn for_client(client_id: DbId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn for_expert(expert_id: DbId) -> Self {
        Self {
            expert_id: Some(expert_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether `request` passes every set filter.
    pub fn matches(&self, request: &ServiceRequest) -> bool {
        self.client_id.map_or(true, |id| id == request.client_id)
            && self.expert_id.map_or(true, |id| id == request.expert_id)
            && self.status.map_or(true, |s| s == request.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn pending() -> ServiceRequest {
        let now = Utc::now();
        ServiceRequest {
            id: 1,
            client_id: 10,
            expert_id: 20,
            service_id: 30,
            agreed_price_cents: 12_500,
            end_date: (now + Duration::days(7)).date_naive(),
            start_date: None,
            status: RequestStatus::Pending,
            expert_response_reason: None,
            cancellation_reason: None,
            expert_completed: false,
            expert_completion_date: None,
            client_confirmed: false,
            confirmation_date: None,
            has_dispute: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_lifecycle_sets_fields() {
        let mut req = pending();
        let now = Utc::now();

        req.apply(&Transition::Accept { reason: Some("Happy to help".into()) }, now)
            .unwrap();
        assert_eq!(req.status, RequestStatus::Accepted);
        assert_eq!(req.expert_response_reason.as_deref(), Some("Happy to help"));

        req.apply(&Transition::Start, now).unwrap();
        assert_eq!(req.start_date, Some(now.date_naive()));

        req.apply(&Transition::MarkExpertCompleted, now).unwrap();
        assert!(req.expert_completed);
        assert_eq!(req.expert_completion_date, Some(now));
        assert_eq!(req.status, RequestStatus::AwaitingConfirmation);

        req.apply(&Transition::Confirm, now).unwrap();
        assert!(req.client_confirmed);
        assert_eq!(req.confirmation_date, Some(now));
        assert_eq!(req.status, RequestStatus::Completed);
        assert_eq!(req.agreed_price_cents, 12_500);
    }

    #[test]
    fn failed_guard_leaves_record_untouched() {
        let mut req = pending();
        let before = req.clone();

        let err = req.apply(&Transition::Confirm, Utc::now()).unwrap_err();

        assert_eq!(
            err,
            CoreError::InvalidState {
                action: "confirm",
                current: RequestStatus::Pending
            }
        );
        assert_eq!(req, before);
    }

    #[test]
    fn cancel_records_reason() {
        let mut req = pending();
        req.apply(
            &Transition::Cancel { reason: Some("Changed plans".into()) },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(req.status, RequestStatus::Cancelled);
        assert_eq!(req.cancellation_reason.as_deref(), Some("Changed plans"));
    }

    #[test]
    fn accept_without_reason_keeps_previous_reason() {
        let mut req = pending();
        req.expert_response_reason = Some("earlier note".into());
        req.apply(&Transition::Accept { reason: None }, Utc::now()).unwrap();
        assert_eq!(req.expert_response_reason.as_deref(), Some("earlier note"));
    }

    #[test]
    fn filter_matches_on_every_set_field() {
        let req = pending();
        assert!(RequestFilter::default().matches(&req));
        assert!(RequestFilter::for_client(10).matches(&req));
        assert!(!RequestFilter::for_client(11).matches(&req));
        assert!(RequestFilter::for_expert(20)
            .with_status(RequestStatus::Pending)
            .matches(&req));
        assert!(!RequestFilter::for_expert(20)
            .with_status(RequestStatus::Completed)
            .matches(&req));
    }
}
