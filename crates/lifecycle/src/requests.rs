//! Service request creation and status transitions.
//!
//! Every status change goes through [`RequestService::transition`], which
//! asks the store to check the guard and write atomically. Side effects run
//! only after a write was applied, in this order:
//!
//! 1. notifications
//! 2. payment release (on `completed`)
//! 3. profile counters (on `completed`)

use std::sync::Arc;

use chrono::Utc;
use hirely_core::error::CoreError;
use hirely_core::request_lifecycle::{auto_confirm_cutoff, Transition};
use hirely_core::status::RequestStatus;
use hirely_core::types::DbId;
use hirely_db::models::service_request::{
    CreateServiceRequest, NewServiceRequest, RequestFilter, ServiceRequest,
};
use hirely_db::models::user::User;
use hirely_db::{MarketplaceStore, StoreError, TransitionOutcome};
use hirely_events::NotificationSink;

use crate::config::LifecycleConfig;
use crate::error::LifecycleError;
use crate::messages;
use crate::payment::PaymentRelease;

pub struct RequestService<S> {
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    payments: Arc<dyn PaymentRelease>,
    config: LifecycleConfig,
}

impl<S> Clone for RequestService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
            payments: Arc::clone(&self.payments),
            config: self.config,
        }
    }
}

impl<S: MarketplaceStore> RequestService<S> {
    pub fn new(
        store: Arc<S>,
        sink: Arc<dyn NotificationSink>,
        payments: Arc<dyn PaymentRelease>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            sink,
            payments,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a `pending` request and notify the expert.
    ///
    /// The price defaults to the service's list price. Returns `Ok(None)`
    /// when an active request already exists for the same client, expert
    /// and service.
    pub async fn create_service_request(
        &self,
        input: CreateServiceRequest,
    ) -> Result<Option<ServiceRequest>, LifecycleError> {
        let service = self
            .store
            .find_service(input.service_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "service",
                id: input.service_id,
            })?;

        let agreed_price_cents = input
            .agreed_price_cents
            .or(service.price_cents)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Service {} has no price and no agreed price was given",
                    service.id
                ))
            })?;
        if agreed_price_cents < 0 {
            return Err(CoreError::Validation("Agreed price must not be negative".into()).into());
        }

        let new_request = NewServiceRequest {
            client_id: input.client_id,
            expert_id: input.expert_id,
            service_id: input.service_id,
            agreed_price_cents,
            end_date: input.end_date,
        };

        let Some(request) = self.store.create_if_no_active(&new_request).await? else {
            tracing::debug!(
                client_id = input.client_id,
                expert_id = input.expert_id,
                service_id = input.service_id,
                "Active request already exists, not creating"
            );
            return Ok(None);
        };

        tracing::info!(
            request_id = request.id,
            client_id = request.client_id,
            expert_id = request.expert_id,
            agreed_price_cents = request.agreed_price_cents,
            "Service request created"
        );

        if let Some(expert) = self.lookup_user(request.expert_id).await {
            self.sink.send(messages::new_request(&expert));
        }
        Ok(Some(request))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    pub async fn accept_request(
        &self,
        id: DbId,
        reason: Option<String>,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        self.transition(id, Transition::Accept { reason }).await
    }

    pub async fn reject_request(
        &self,
        id: DbId,
        reason: Option<String>,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        self.transition(id, Transition::Reject { reason }).await
    }

    /// Move an accepted request into work. Stamps `start_date` with today.
    pub async fn start_request(&self, id: DbId) -> Result<Option<ServiceRequest>, StoreError> {
        self.transition(id, Transition::Start).await
    }

    pub async fn cancel_request(
        &self,
        id: DbId,
        reason: Option<String>,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        self.transition(id, Transition::Cancel { reason }).await
    }

    /// Move a request to `status` through the same transition table as the
    /// dedicated operations. `pending` is never a valid target.
    pub async fn update_service_status(
        &self,
        id: DbId,
        status: RequestStatus,
        reason: Option<String>,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        let Some(transition) = Transition::into_status(status, reason) else {
            tracing::debug!(request_id = id, %status, "Status is not a transition target");
            return Ok(None);
        };
        self.transition(id, transition).await
    }

    /// Expert reports the work done. Only valid from `in_progress`.
    pub async fn mark_expert_completed(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.transition(id, Transition::MarkExpertCompleted).await?.is_some())
    }

    /// Client confirms completion. Only valid from `awaiting_confirmation`.
    ///
    /// Also used by the sweeper; of two racing confirmations exactly one
    /// returns `true` and runs the payment and counter side effects.
    pub async fn confirm_service(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.transition(id, Transition::Confirm).await?.is_some())
    }

    async fn transition(
        &self,
        id: DbId,
        transition: Transition,
    ) -> Result<Option<ServiceRequest>, StoreError> {
        let action = transition.action();
        match self
            .store
            .apply_transition(id, &transition, Utc::now())
            .await?
        {
            TransitionOutcome::Applied { previous, request } => {
                tracing::info!(
                    request_id = id,
                    from = %previous,
                    to = %request.status,
                    "Service request transitioned"
                );
                self.after_transition(&transition, &request).await;
                Ok(Some(request))
            }
            TransitionOutcome::NotFound => {
                tracing::debug!(request_id = id, action, "Service request not found");
                Ok(None)
            }
            TransitionOutcome::InvalidState { current } => {
                let err = CoreError::InvalidState { action, current };
                tracing::debug!(request_id = id, error = %err, "Transition refused");
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Side effects
    // -----------------------------------------------------------------------

    async fn after_transition(&self, transition: &Transition, request: &ServiceRequest) {
        match transition {
            Transition::MarkExpertCompleted => {
                if let Some(client) = self.lookup_user(request.client_id).await {
                    self.sink.send(messages::completed_confirm_now(&client));
                }
            }
            Transition::Confirm => {
                self.release_payment(request).await;
                self.record_completion(request).await;
            }
            _ => self.notify_both(request).await,
        }
    }

    async fn notify_both(&self, request: &ServiceRequest) {
        if let Some(expert) = self.lookup_user(request.expert_id).await {
            self.sink
                .send(messages::status_update_for_expert(&expert, request.status));
        }
        if let Some(client) = self.lookup_user(request.client_id).await {
            self.sink
                .send(messages::status_update_for_client(&client, request.status));
        }
    }

    async fn release_payment(&self, request: &ServiceRequest) {
        match self.payments.release_funds(request.id).await {
            Ok(true) => tracing::info!(request_id = request.id, "Payment released"),
            Ok(false) => tracing::warn!(request_id = request.id, "No escrowed payment to release"),
            Err(e) => tracing::error!(request_id = request.id, error = %e, "Payment release failed"),
        }
    }

    async fn record_completion(&self, request: &ServiceRequest) {
        if let Err(e) = self
            .store
            .record_completion(request.expert_id, request.client_id, request.agreed_price_cents)
            .await
        {
            tracing::error!(request_id = request.id, error = %e, "Failed to update profile counters");
        }
    }

    /// Notification recipients. Lookup failures are logged and skip the send.
    async fn lookup_user(&self, user_id: DbId) -> Option<User> {
        match self.store.find_user(user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::warn!(user_id, "Notification recipient not found");
                None
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load notification recipient");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn find_request(&self, id: DbId) -> Result<Option<ServiceRequest>, StoreError> {
        self.store.find_request(id).await
    }

    /// Requests matching `filter`, newest first.
    pub async fn get_service_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        self.store.list_requests(filter).await
    }

    /// Requests the sweeper would confirm right now.
    pub async fn get_auto_complete_candidates(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        let cutoff = auto_confirm_cutoff(Utc::now(), self.config.auto_confirm_after_hours);
        self.store.auto_confirm_candidates(cutoff).await
    }
}
