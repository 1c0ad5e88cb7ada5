//! In-process [`MarketplaceStore`](super::MarketplaceStore).
//!
//! All state sits behind a single [`Mutex`], so every trait method is
//! atomic with respect to every other. Backs the lifecycle tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use hirely_core::request_lifecycle::{is_auto_confirm_candidate, Transition};
use hirely_core::stats::{self, RequestStats};
use hirely_core::status::{OtpEventType, RequestStatus};
use hirely_core::types::{Cents, DbId, Timestamp};

use super::{
    OtpEventLog, OtpStore, ProfileLedger, ServiceCatalog, ServiceRequestStore, StoreError,
    TransitionOutcome, UserDirectory,
};
use crate::models::otp::{OtpEvent, OtpRecord};
use crate::models::profile::{ClientCounters, ExpertCounters};
use crate::models::service::{CreateService, Service};
use crate::models::service_request::{NewServiceRequest, RequestFilter, ServiceRequest};
use crate::models::user::{CreateUser, User};

#[derive(Default)]
struct State {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    services: BTreeMap<DbId, Service>,
    otps: HashMap<DbId, OtpRecord>,
    otp_events: Vec<OtpEvent>,
    requests: BTreeMap<DbId, ServiceRequest>,
    experts: HashMap<DbId, ExpertCounters>,
    clients: HashMap<DbId, ClientCounters>,
}

impl State {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-guarded store with the same guarantees as [`PgStore`](super::postgres::PgStore).
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Seeding and fixtures
    // -----------------------------------------------------------------------

    /// Insert an inactive user.
    pub fn insert_user(&self, input: CreateUser) -> User {
        let mut state = self.lock();
        let now = Utc::now();
        let user = User {
            id: state.allocate_id(),
            email: input.email,
            first_name: input.first_name,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub fn insert_service(&self, input: CreateService) -> Service {
        let mut state = self.lock();
        let now = Utc::now();
        let service = Service {
            id: state.allocate_id(),
            expert_id: input.expert_id,
            title: input.title,
            price_cents: input.price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.services.insert(service.id, service.clone());
        service
    }

    /// Overwrite the OTP clock columns. Returns `false` if the user has no record.
    pub fn set_otp_times(
        &self,
        user_id: DbId,
        created_at: Timestamp,
        last_sent_at: Option<Timestamp>,
    ) -> bool {
        let mut state = self.lock();
        match state.otps.get_mut(&user_id) {
            Some(record) => {
                record.created_at = created_at;
                record.last_sent_at = last_sent_at;
                true
            }
            None => false,
        }
    }

    /// Overwrite `expert_completion_date` of a request.
    pub fn set_expert_completion_date(&self, request_id: DbId, at: Option<Timestamp>) -> bool {
        let mut state = self.lock();
        match state.requests.get_mut(&request_id) {
            Some(request) => {
                request.expert_completion_date = at;
                true
            }
            None => false,
        }
    }

    /// Overwrite `created_at` of a request.
    pub fn set_request_created_at(&self, request_id: DbId, at: Timestamp) -> bool {
        let mut state = self.lock();
        match state.requests.get_mut(&request_id) {
            Some(request) => {
                request.created_at = at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, user_id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn find_otp(&self, user_id: DbId) -> Result<Option<OtpRecord>, StoreError> {
        Ok(self.lock().otps.get(&user_id).cloned())
    }

    async fn upsert_code(
        &self,
        user_id: DbId,
        code: &str,
        now: Timestamp,
    ) -> Result<OtpRecord, StoreError> {
        let mut state = self.lock();
        let record = state
            .otps
            .entry(user_id)
            .and_modify(|record| {
                record.otp_code = Some(code.to_string());
                record.is_verified = false;
                record.created_at = now;
                record.last_sent_at = Some(now);
                record.updated_at = now;
            })
            .or_insert_with(|| OtpRecord {
                user_id,
                otp_code: Some(code.to_string()),
                is_verified: false,
                created_at: now,
                last_sent_at: Some(now),
                updated_at: now,
            });
        Ok(record.clone())
    }

    async fn complete_verification(
        &self,
        user_id: DbId,
        code: &str,
        event_id: DbId,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let now = Utc::now();

        let Some(record) = state.otps.get_mut(&user_id) else {
            return Ok(false);
        };
        if record.otp_code.as_deref() != Some(code) {
            return Ok(false);
        }
        record.otp_code = None;
        record.is_verified = true;
        record.updated_at = now;

        if let Some(user) = state.users.get_mut(&user_id) {
            user.is_active = true;
            user.updated_at = now;
        }
        if let Some(event) = state.otp_events.iter_mut().find(|e| e.id == event_id) {
            event.event_type = OtpEventType::Verified;
        }
        Ok(true)
    }
}

#[async_trait]
impl OtpEventLog for MemoryStore {
    async fn append_event(
        &self,
        user_id: DbId,
        event_type: OtpEventType,
    ) -> Result<OtpEvent, StoreError> {
        let mut state = self.lock();
        let event = OtpEvent {
            id: state.allocate_id(),
            user_id,
            event_type,
            created_at: Utc::now(),
        };
        state.otp_events.push(event.clone());
        Ok(event)
    }

    async fn set_event_type(
        &self,
        event_id: DbId,
        event_type: OtpEventType,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        match state.otp_events.iter_mut().find(|e| e.id == event_id) {
            Some(event) => {
                event.event_type = event_type;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_events(&self, user_id: DbId) -> Result<Vec<OtpEvent>, StoreError> {
        Ok(self
            .lock()
            .otp_events
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ServiceCatalog for MemoryStore {
    async fn find_service(&self, service_id: DbId) -> Result<Option<Service>, StoreError> {
        Ok(self.lock().services.get(&service_id).cloned())
    }
}

#[async_trait]
impl ProfileLedger for MemoryStore {
    async fn record_completion(
        &self,
        expert_id: DbId,
        client_id: DbId,
        price_cents: Cents,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();

        let expert = state.experts.entry(expert_id).or_insert(ExpertCounters {
            user_id: expert_id,
            ..ExpertCounters::default()
        });
        expert.completed_services += 1;
        expert.total_earnings_cents += price_cents;

        let client = state.clients.entry(client_id).or_insert(ClientCounters {
            user_id: client_id,
            ..ClientCounters::default()
        });
        client.services_purchased += 1;
        client.total_spent_cents += price_cents;
        Ok(())
    }

    async fn expert_counters(&self, user_id: DbId) -> Result<ExpertCounters, StoreError> {
        Ok(self.lock().experts.get(&user_id).copied().unwrap_or(ExpertCounters {
            user_id,
            ..ExpertCounters::default()
        }))
    }

    async fn client_counters(&self, user_id: DbId) -> Result<ClientCounters, StoreError> {
        Ok(self.lock().clients.get(&user_id).copied().unwrap_or(ClientCounters {
            user_id,
            ..ClientCounters::default()
        }))
    }
}

#[async_trait]
impl ServiceRequestStore for MemoryStore {
    async fn create_if_no_active(
        &self,
        input: &NewServiceRequest,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        let mut state = self.lock();

        let duplicate = state.requests.values().any(|r| {
            r.client_id == input.client_id
                && r.expert_id == input.expert_id
                && r.service_id == input.service_id
                && r.status.is_active()
        });
        if duplicate {
            return Ok(None);
        }

        let now = Utc::now();
        let request = ServiceRequest {
            id: state.allocate_id(),
            client_id: input.client_id,
            expert_id: input.expert_id,
            service_id: input.service_id,
            agreed_price_cents: input.agreed_price_cents,
            end_date: input.end_date,
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
        };
        state.requests.insert(request.id, request.clone());
        Ok(Some(request))
    }

    async fn find_request(&self, id: DbId) -> Result<Option<ServiceRequest>, StoreError> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, StoreError> {
        let mut rows: Vec<ServiceRequest> = self
            .lock()
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn apply_transition(
        &self,
        id: DbId,
        transition: &Transition,
        now: Timestamp,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut state = self.lock();
        let Some(request) = state.requests.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        let previous = request.status;
        if request.apply(transition, now).is_err() {
            return Ok(TransitionOutcome::InvalidState { current: previous });
        }
        Ok(TransitionOutcome::Applied {
            previous,
            request: request.clone(),
        })
    }

    async fn auto_confirm_candidates(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        let mut rows: Vec<ServiceRequest> = self
            .lock()
            .requests
            .values()
            .filter(|r| {
                is_auto_confirm_candidate(
                    r.status,
                    r.expert_completed,
                    r.client_confirmed,
                    r.expert_completion_date,
                    cutoff,
                )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.expert_completion_date
                .cmp(&b.expert_completion_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn request_stats(
        &self,
        filter: &RequestFilter,
        recent_limit: usize,
    ) -> Result<RequestStats, StoreError> {
        let state = self.lock();
        let snapshot = state
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .map(ServiceRequest::to_recent);
        Ok(stats::summarize(snapshot, recent_limit))
    }
}
