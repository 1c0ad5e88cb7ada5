//! OTP issue, verification and resend cooldown.
//!
//! Every verification attempt and resend check appends its audit event
//! before the OTP record is read, so the log records attempts that later
//! fail on a store error too. The only rewrite of an event is promoting the
//! attempt's own event on success.
//!
//! Ids without a user row are answered before any write: the audit log
//! only holds events for existing users.

use std::sync::Arc;

use chrono::Utc;
use hirely_core::error::CoreError;
use hirely_core::otp::{self, OtpFailure, OtpVerification};
use hirely_core::status::OtpEventType;
use hirely_core::types::DbId;
use hirely_db::models::otp::OtpEvent;
use hirely_db::models::user::User;
use hirely_db::{MarketplaceStore, StoreError};
use hirely_events::NotificationSink;

use crate::config::LifecycleConfig;
use crate::error::LifecycleError;
use crate::messages;

pub struct OtpService<S> {
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    config: LifecycleConfig,
}

impl<S> Clone for OtpService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
            config: self.config,
        }
    }
}

impl<S: MarketplaceStore> OtpService<S> {
    pub fn new(store: Arc<S>, sink: Arc<dyn NotificationSink>, config: LifecycleConfig) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Store a fresh code for `user_id` and return it.
    ///
    /// Invalidates any previous code and restarts both the expiry and the
    /// cooldown clocks.
    pub async fn generate_otp(&self, user_id: DbId) -> Result<String, LifecycleError> {
        let user = self.require_user(user_id).await?;
        Ok(self.store_code(&user).await?)
    }

    /// Generate a code and email it to the user.
    pub async fn issue_otp(&self, user_id: DbId) -> Result<(), LifecycleError> {
        let user = self.require_user(user_id).await?;
        let code = self.store_code(&user).await?;
        self.sink.send(messages::otp_code(&user, &code));
        Ok(())
    }

    async fn store_code(&self, user: &User) -> Result<String, StoreError> {
        let code = otp::generate_code();
        self.store.upsert_code(user.id, &code, Utc::now()).await?;
        self.store.append_event(user.id, OtpEventType::Sent).await?;

        tracing::info!(user_id = user.id, "OTP generated");
        Ok(code)
    }

    async fn require_user(&self, user_id: DbId) -> Result<User, LifecycleError> {
        self.store.find_user(user_id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "user",
                id: user_id,
            }
            .into()
        })
    }

    /// Whether the current code has expired. Fails closed without a record.
    pub async fn is_otp_expired(&self, user_id: DbId) -> Result<bool, StoreError> {
        let record = self.store.find_otp(user_id).await?;
        Ok(record.map_or(true, |r| r.is_expired(Utc::now(), self.config.otp_expiry())))
    }

    /// Check `code` and, on success, consume it and activate the user.
    ///
    /// An unknown user fails with `NotFound` and logs nothing.
    pub async fn verify_otp(&self, user_id: DbId, code: &str) -> Result<OtpVerification, StoreError> {
        if self.store.find_user(user_id).await?.is_none() {
            tracing::debug!(user_id, "OTP verification for unknown user");
            return Ok(OtpVerification::Failed(OtpFailure::NotFound));
        }

        let event = self.store.append_event(user_id, OtpEventType::Failed).await?;

        let verdict = match self.store.find_otp(user_id).await? {
            None => OtpVerification::Failed(OtpFailure::NotFound),
            Some(record) => otp::check_code(
                record.otp_code.as_deref(),
                code,
                record.created_at,
                Utc::now(),
                self.config.otp_expiry(),
            ),
        };

        if let OtpVerification::Failed(reason) = verdict {
            tracing::debug!(user_id, reason = ?reason, "OTP verification refused");
            return Ok(verdict);
        }

        // The code may have been consumed or replaced since it was read.
        if !self
            .store
            .complete_verification(user_id, code, event.id)
            .await?
        {
            tracing::debug!(user_id, "OTP consumed concurrently");
            return Ok(OtpVerification::Failed(OtpFailure::NotFound));
        }

        tracing::info!(user_id, "OTP verified, user activated");
        Ok(OtpVerification::Verified)
    }

    /// Whether a new code may be sent now.
    ///
    /// True without a record, or once the cooldown since the last send has
    /// elapsed. An allowed check promotes its audit event to
    /// `resend_allowed`. Always false for an unknown user.
    pub async fn can_resend_otp(&self, user_id: DbId) -> Result<bool, StoreError> {
        if self.store.find_user(user_id).await?.is_none() {
            tracing::debug!(user_id, "OTP resend check for unknown user");
            return Ok(false);
        }

        let event = self.store.append_event(user_id, OtpEventType::Failed).await?;

        let allowed = match self.store.find_otp(user_id).await? {
            None => true,
            Some(record) => otp::cooldown_elapsed(
                record.last_sent_at,
                Utc::now(),
                self.config.otp_resend_cooldown(),
            ),
        };

        if allowed {
            self.store
                .set_event_type(event.id, OtpEventType::ResendAllowed)
                .await?;
        } else {
            tracing::debug!(user_id, "OTP resend refused, cooldown active");
        }
        Ok(allowed)
    }

    /// Audit trail for a user, oldest first.
    pub async fn otp_events(&self, user_id: DbId) -> Result<Vec<OtpEvent>, StoreError> {
        self.store.list_events(user_id).await
    }
}
