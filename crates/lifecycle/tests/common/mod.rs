//! Shared harness for lifecycle integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use hirely_core::request_lifecycle::Transition;
use hirely_core::stats::RequestStats;
use hirely_core::status::OtpEventType;
use hirely_core::types::{Cents, DbId, Timestamp};
use hirely_db::models::otp::{OtpEvent, OtpRecord};
use hirely_db::models::profile::{ClientCounters, ExpertCounters};
use hirely_db::models::service::{CreateService, Service};
use hirely_db::models::service_request::{
    CreateServiceRequest, NewServiceRequest, RequestFilter, ServiceRequest,
};
use hirely_db::models::user::{CreateUser, User};
use hirely_db::store::{
    OtpEventLog, OtpStore, ProfileLedger, ServiceCatalog, ServiceRequestStore, UserDirectory,
};
use hirely_db::{MemoryStore, StoreError, TransitionOutcome};
use hirely_events::{Notification, NotificationSink};
use hirely_lifecycle::{
    AutoConfirmSweeper, LifecycleConfig, OtpService, PaymentError, PaymentRelease, RequestService,
    StatsService,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn to(&self, recipient: &str) -> Vec<Notification> {
        self.all()
            .into_iter()
            .filter(|n| n.recipient == recipient)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn send(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// Counts release calls; fails every call when `failing` is set.
#[derive(Default)]
pub struct CountingPayments {
    calls: AtomicUsize,
    failing: bool,
}

impl CountingPayments {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentRelease for CountingPayments {
    async fn release_funds(&self, _request_id: DbId) -> Result<bool, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(PaymentError::Unavailable("gateway down".into()));
        }
        Ok(true)
    }
}

/// `MemoryStore` with switchable store failures.
///
/// Transitions on ids passed to [`fail_transitions_for`](Self::fail_transitions_for)
/// and, once [`fail_counters`](Self::fail_counters) is called, every
/// `record_completion` return a database error without touching state.
/// Everything else delegates to the inner store.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing_transitions: Mutex<HashSet<DbId>>,
    failing_counters: AtomicBool,
}

impl FaultyStore {
    pub fn fail_transitions_for(&self, id: DbId) {
        self.failing_transitions.lock().unwrap().insert(id);
    }

    pub fn fail_counters(&self) {
        self.failing_counters.store(true, Ordering::SeqCst);
    }

    fn injected() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }
}

impl Deref for FaultyStore {
    type Target = MemoryStore;

    fn deref(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl UserDirectory for FaultyStore {
    async fn find_user(&self, user_id: DbId) -> Result<Option<User>, StoreError> {
        self.inner.find_user(user_id).await
    }
}

#[async_trait]
impl OtpStore for FaultyStore {
    async fn find_otp(&self, user_id: DbId) -> Result<Option<OtpRecord>, StoreError> {
        self.inner.find_otp(user_id).await
    }

    async fn upsert_code(
        &self,
        user_id: DbId,
        code: &str,
        now: Timestamp,
    ) -> Result<OtpRecord, StoreError> {
        self.inner.upsert_code(user_id, code, now).await
    }

    async fn complete_verification(
        &self,
        user_id: DbId,
        code: &str,
        event_id: DbId,
    ) -> Result<bool, StoreError> {
        self.inner.complete_verification(user_id, code, event_id).await
    }
}

#[async_trait]
impl OtpEventLog for FaultyStore {
    async fn append_event(
        &self,
        user_id: DbId,
        event_type: OtpEventType,
    ) -> Result<OtpEvent, StoreError> {
        self.inner.append_event(user_id, event_type).await
    }

    async fn set_event_type(
        &self,
        event_id: DbId,
        event_type: OtpEventType,
    ) -> Result<bool, StoreError> {
        self.inner.set_event_type(event_id, event_type).await
    }

    async fn list_events(&self, user_id: DbId) -> Result<Vec<OtpEvent>, StoreError> {
        self.inner.list_events(user_id).await
    }
}

#[async_trait]
impl ServiceCatalog for FaultyStore {
    async fn find_service(&self, service_id: DbId) -> Result<Option<Service>, StoreError> {
        self.inner.find_service(service_id).await
    }
}

#[async_trait]
impl ProfileLedger for FaultyStore {
    async fn record_completion(
        &self,
        expert_id: DbId,
        client_id: DbId,
        price_cents: Cents,
    ) -> Result<(), StoreError> {
        if self.failing_counters.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner
            .record_completion(expert_id, client_id, price_cents)
            .await
    }

    async fn expert_counters(&self, user_id: DbId) -> Result<ExpertCounters, StoreError> {
        self.inner.expert_counters(user_id).await
    }

    async fn client_counters(&self, user_id: DbId) -> Result<ClientCounters, StoreError> {
        self.inner.client_counters(user_id).await
    }
}

#[async_trait]
impl ServiceRequestStore for FaultyStore {
    async fn create_if_no_active(
        &self,
        input: &NewServiceRequest,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        self.inner.create_if_no_active(input).await
    }

    async fn find_request(&self, id: DbId) -> Result<Option<ServiceRequest>, StoreError> {
        self.inner.find_request(id).await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, StoreError> {
        self.inner.list_requests(filter).await
    }

    async fn apply_transition(
        &self,
        id: DbId,
        transition: &Transition,
        now: Timestamp,
    ) -> Result<TransitionOutcome, StoreError> {
        if self.failing_transitions.lock().unwrap().contains(&id) {
            return Err(Self::injected());
        }
        self.inner.apply_transition(id, transition, now).await
    }

    async fn auto_confirm_candidates(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        self.inner.auto_confirm_candidates(cutoff).await
    }

    async fn request_stats(
        &self,
        filter: &RequestFilter,
        recent_limit: usize,
    ) -> Result<RequestStats, StoreError> {
        self.inner.request_stats(filter, recent_limit).await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<FaultyStore>,
    pub sink: Arc<RecordingSink>,
    pub payments: Arc<CountingPayments>,
    pub otp: OtpService<FaultyStore>,
    pub requests: RequestService<FaultyStore>,
    pub stats: StatsService<FaultyStore>,
    pub client: User,
    pub expert: User,
    pub service: Service,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_payments(CountingPayments::default())
    }

    pub fn with_payments(payments: CountingPayments) -> Self {
        let store = Arc::new(FaultyStore::default());
        let sink = Arc::new(RecordingSink::default());
        let payments = Arc::new(payments);
        let config = LifecycleConfig::default();

        let client = store.insert_user(CreateUser {
            email: "client@example.com".into(),
            first_name: "Cleo".into(),
        });
        let expert = store.insert_user(CreateUser {
            email: "expert@example.com".into(),
            first_name: "Eli".into(),
        });
        let service = store.insert_service(CreateService {
            expert_id: Some(expert.id),
            title: "Brand identity".into(),
            price_cents: Some(10_000),
        });

        Self {
            otp: OtpService::new(store.clone(), sink.clone(), config),
            requests: RequestService::new(store.clone(), sink.clone(), payments.clone(), config),
            stats: StatsService::new(store.clone()),
            store,
            sink,
            payments,
            client,
            expert,
            service,
        }
    }

    pub fn sweeper(&self) -> AutoConfirmSweeper<FaultyStore> {
        AutoConfirmSweeper::new(self.requests.clone())
    }

    pub fn create_input(&self, price: Option<Cents>) -> CreateServiceRequest {
        CreateServiceRequest {
            client_id: self.client.id,
            expert_id: self.expert.id,
            service_id: self.service.id,
            agreed_price_cents: price,
            end_date: end_date(),
        }
    }

    /// Create a request for the default triple.
    pub async fn create(&self) -> ServiceRequest {
        self.requests
            .create_service_request(self.create_input(None))
            .await
            .unwrap()
            .expect("no active request for the triple")
    }

    /// Create a request and drive it to `awaiting_confirmation`.
    pub async fn awaiting_confirmation(&self) -> ServiceRequest {
        let request = self.create().await;
        self.drive_to_awaiting(request).await
    }

    /// Like [`awaiting_confirmation`](Self::awaiting_confirmation), for `service`.
    pub async fn awaiting_confirmation_for(&self, service: &Service) -> ServiceRequest {
        let request = self
            .requests
            .create_service_request(CreateServiceRequest {
                service_id: service.id,
                ..self.create_input(None)
            })
            .await
            .unwrap()
            .expect("no active request for the triple");
        self.drive_to_awaiting(request).await
    }

    async fn drive_to_awaiting(&self, request: ServiceRequest) -> ServiceRequest {
        self.requests.accept_request(request.id, None).await.unwrap().unwrap();
        self.requests.start_request(request.id).await.unwrap().unwrap();
        assert!(self.requests.mark_expert_completed(request.id).await.unwrap());
        self.requests.find_request(request.id).await.unwrap().unwrap()
    }

    /// Pretend the expert completed `request_id` `hours` ago.
    pub fn backdate_completion(&self, request_id: DbId, hours: i64) {
        assert!(self
            .store
            .set_expert_completion_date(request_id, Some(Utc::now() - Duration::hours(hours))));
    }

    /// Register another service by the same expert, so the triple differs.
    pub fn another_service(&self, price_cents: Option<Cents>) -> Service {
        self.store.insert_service(CreateService {
            expert_id: Some(self.expert.id),
            title: "Extra service".into(),
            price_cents,
        })
    }
}

pub fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 31).unwrap()
}
