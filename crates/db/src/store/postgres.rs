//! [`MarketplaceStore`](super::MarketplaceStore) backed by Postgres.

use async_trait::async_trait;
use hirely_core::request_lifecycle::Transition;
use hirely_core::stats::RequestStats;
use hirely_core::status::OtpEventType;
use hirely_core::types::{Cents, DbId, Timestamp};
use sqlx::PgPool;

use super::{
    OtpEventLog, OtpStore, ProfileLedger, ServiceCatalog, ServiceRequestStore, StoreError,
    TransitionOutcome, UserDirectory,
};
use crate::models::otp::{OtpEvent, OtpRecord};
use crate::models::profile::{ClientCounters, ExpertCounters};
use crate::models::service::Service;
use crate::models::service_request::{NewServiceRequest, RequestFilter, ServiceRequest};
use crate::models::user::User;
use crate::repositories::{
    OtpEventRepo, OtpRepo, ProfileRepo, ServiceRepo, ServiceRequestRepo, UserRepo,
};

/// Thin adapter from the store traits to the repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_user(&self, user_id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl OtpStore for PgStore {
    async fn find_otp(&self, user_id: DbId) -> Result<Option<OtpRecord>, StoreError> {
        Ok(OtpRepo::find(&self.pool, user_id).await?)
    }

    async fn upsert_code(
        &self,
        user_id: DbId,
        code: &str,
        now: Timestamp,
    ) -> Result<OtpRecord, StoreError> {
        Ok(OtpRepo::upsert_code(&self.pool, user_id, code, now).await?)
    }

    async fn complete_verification(
        &self,
        user_id: DbId,
        code: &str,
        event_id: DbId,
    ) -> Result<bool, StoreError> {
        Ok(OtpRepo::complete_verification(&self.pool, user_id, code, event_id).await?)
    }
}

#[async_trait]
impl OtpEventLog for PgStore {
    async fn append_event(
        &self,
        user_id: DbId,
        event_type: OtpEventType,
    ) -> Result<OtpEvent, StoreError> {
        Ok(OtpEventRepo::append(&self.pool, user_id, event_type).await?)
    }

    async fn set_event_type(
        &self,
        event_id: DbId,
        event_type: OtpEventType,
    ) -> Result<bool, StoreError> {
        Ok(OtpEventRepo::set_event_type(&self.pool, event_id, event_type).await?)
    }

    async fn list_events(&self, user_id: DbId) -> Result<Vec<OtpEvent>, StoreError> {
        Ok(OtpEventRepo::list_for_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl ServiceCatalog for PgStore {
    async fn find_service(&self, service_id: DbId) -> Result<Option<Service>, StoreError> {
        Ok(ServiceRepo::find_by_id(&self.pool, service_id).await?)
    }
}

#[async_trait]
impl ProfileLedger for PgStore {
    async fn record_completion(
        &self,
        expert_id: DbId,
        client_id: DbId,
        price_cents: Cents,
    ) -> Result<(), StoreError> {
        Ok(ProfileRepo::record_completion(&self.pool, expert_id, client_id, price_cents).await?)
    }

    async fn expert_counters(&self, user_id: DbId) -> Result<ExpertCounters, StoreError> {
        Ok(ProfileRepo::expert_counters(&self.pool, user_id).await?)
    }

    async fn client_counters(&self, user_id: DbId) -> Result<ClientCounters, StoreError> {
        Ok(ProfileRepo::client_counters(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl ServiceRequestStore for PgStore {
    async fn create_if_no_active(
        &self,
        input: &NewServiceRequest,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        Ok(ServiceRequestRepo::create_if_no_active(&self.pool, input).await?)
    }

    async fn find_request(&self, id: DbId) -> Result<Option<ServiceRequest>, StoreError> {
        Ok(ServiceRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, StoreError> {
        Ok(ServiceRequestRepo::list(&self.pool, filter).await?)
    }

    async fn apply_transition(
        &self,
        id: DbId,
        transition: &Transition,
        now: Timestamp,
    ) -> Result<TransitionOutcome, StoreError> {
        Ok(ServiceRequestRepo::apply_transition(&self.pool, id, transition, now).await?)
    }

    async fn auto_confirm_candidates(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        Ok(ServiceRequestRepo::auto_confirm_candidates(&self.pool, cutoff).await?)
    }

    async fn request_stats(
        &self,
        filter: &RequestFilter,
        recent_limit: usize,
    ) -> Result<RequestStats, StoreError> {
        Ok(ServiceRequestRepo::stats(&self.pool, filter, recent_limit).await?)
    }
}
