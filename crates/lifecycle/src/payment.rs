//! Payment release seam invoked when a request completes.

use async_trait::async_trait;
use hirely_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Releases escrowed funds for a completed request.
#[async_trait]
pub trait PaymentRelease: Send + Sync {
    /// Returns `Ok(false)` when there was nothing in escrow to release.
    async fn release_funds(&self, request_id: DbId) -> Result<bool, PaymentError>;
}

/// Stand-in until a gateway is integrated: logs and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscrowStub;

#[async_trait]
impl PaymentRelease for EscrowStub {
    async fn release_funds(&self, request_id: DbId) -> Result<bool, PaymentError> {
        tracing::info!(request_id, "Escrow release requested");
        Ok(true)
    }
}
