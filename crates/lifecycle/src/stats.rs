//! Dashboard aggregates and profile counters.

use std::sync::Arc;

use hirely_core::stats::RequestStats;
use hirely_core::types::DbId;
use hirely_db::models::profile::{ClientCounters, ExpertCounters};
use hirely_db::models::service_request::RequestFilter;
use hirely_db::{MarketplaceStore, StoreError};

pub struct StatsService<S> {
    store: Arc<S>,
}

impl<S: MarketplaceStore> StatsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Totals and the `recent_limit` newest requests matching `filter`,
    /// read from one snapshot.
    pub async fn get_client_stats(
        &self,
        filter: &RequestFilter,
        recent_limit: usize,
    ) -> Result<RequestStats, StoreError> {
        self.store.request_stats(filter, recent_limit).await
    }

    pub async fn expert_counters(&self, user_id: DbId) -> Result<ExpertCounters, StoreError> {
        self.store.expert_counters(user_id).await
    }

    pub async fn client_counters(&self, user_id: DbId) -> Result<ClientCounters, StoreError> {
        self.store.client_counters(user_id).await
    }
}
