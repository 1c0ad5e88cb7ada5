//! Periodic confirmation of completions the client never confirmed.
//!
//! [`AutoConfirmSweeper`] selects requests that have waited in
//! `awaiting_confirmation` past the configured window and confirms each one
//! exactly as a manual client confirmation would. Running it twice, or
//! alongside manual confirmations, confirms each request once.

use std::time::Duration;

use hirely_db::{MarketplaceStore, StoreError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::requests::RequestService;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoConfirmReport {
    /// Requests selected by the sweep query.
    pub candidates: usize,
    /// Requests this sweep confirmed.
    pub confirmed: usize,
    /// Requests confirmed or moved elsewhere by someone else first.
    pub skipped: usize,
    /// Requests whose confirmation hit a store error.
    pub failed: usize,
}

pub struct AutoConfirmSweeper<S> {
    requests: RequestService<S>,
}

impl<S: MarketplaceStore> AutoConfirmSweeper<S> {
    pub fn new(requests: RequestService<S>) -> Self {
        Self { requests }
    }

    /// Confirm every eligible request once.
    ///
    /// Only the candidate query can fail the sweep; per-request failures
    /// are counted and logged and the batch continues.
    pub async fn run_once(&self) -> Result<AutoConfirmReport, StoreError> {
        let candidates = self.requests.get_auto_complete_candidates().await?;
        let mut report = AutoConfirmReport {
            candidates: candidates.len(),
            ..AutoConfirmReport::default()
        };

        for request in candidates {
            match self.requests.confirm_service(request.id).await {
                Ok(true) => report.confirmed += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(request_id = request.id, error = %e, "Auto-confirm failed");
                }
            }
        }

        if report.candidates > 0 {
            tracing::info!(
                candidates = report.candidates,
                confirmed = report.confirmed,
                skipped = report.skipped,
                failed = report.failed,
                "Auto-confirm sweep finished"
            );
        } else {
            tracing::debug!("Auto-confirm sweep found no candidates");
        }
        Ok(report)
    }

    /// Sweep every `period` until `cancel` fires. The first sweep runs
    /// immediately.
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Auto-confirm sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "Auto-confirm sweep failed");
                    }
                }
            }
        }
    }
}
