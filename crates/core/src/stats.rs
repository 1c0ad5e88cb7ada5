//! Client/expert dashboard aggregates over service requests.

use serde::Serialize;

use crate::request_lifecycle::DASHBOARD_ACTIVE_STATUSES;
use crate::status::RequestStatus;
use crate::types::{Cents, DbId, Timestamp};

/// Default number of recent requests returned alongside the summary.
pub const DEFAULT_RECENT_LIMIT: usize = 3;

/// Counts and spend over a filtered set of requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_requests: i64,
    /// Requests that are `pending` or `in_progress`.
    pub active_requests: i64,
    pub completed_requests: i64,
    /// Sum of `agreed_price` over completed requests only.
    pub total_spent_cents: Cents,
}

impl StatsSummary {
    /// Fold one request into the summary.
    pub fn record(&mut self, status: RequestStatus, agreed_price_cents: Cents) {
        self.total_requests += 1;
        if DASHBOARD_ACTIVE_STATUSES.contains(&status) {
            self.active_requests += 1;
        }
        if status == RequestStatus::Completed {
            self.completed_requests += 1;
            self.total_spent_cents += agreed_price_cents;
        }
    }
}

/// Compact projection of a request for "recent activity" lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentRequest {
    pub id: DbId,
    pub status: RequestStatus,
    pub agreed_price_cents: Cents,
    pub created_at: Timestamp,
}

/// Summary plus the newest requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    pub summary: StatsSummary,
    pub recent_requests: Vec<RecentRequest>,
}

/// Aggregate a snapshot of requests in a single pass.
///
/// `recent_requests` is ordered newest first and truncated to `recent_limit`.
pub fn summarize<I>(requests: I, recent_limit: usize) -> RequestStats
where
    I: IntoIterator<Item = RecentRequest>,
{
    let mut summary = StatsSummary::default();
    let mut recent = Vec::new();

    for request in requests {
        summary.record(request.status, request.agreed_price_cents);
        recent.push(request);
    }

    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    recent.truncate(recent_limit);

    RequestStats {
        summary,
        recent_requests: recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(id: DbId, status: RequestStatus, price: Cents, age_minutes: i64) -> RecentRequest {
        RecentRequest {
            id,
            status,
            agreed_price_cents: price,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn mixed_requests_aggregate_correctly() {
        let rows = vec![
            row(1, RequestStatus::Completed, 10_000, 50),
            row(2, RequestStatus::Completed, 20_000, 40),
            row(3, RequestStatus::Pending, 5_000, 30),
            row(4, RequestStatus::InProgress, 7_500, 20),
            row(5, RequestStatus::Cancelled, 9_900, 10),
        ];

        let stats = summarize(rows, DEFAULT_RECENT_LIMIT);

        assert_eq!(
            stats.summary,
            StatsSummary {
                total_requests: 5,
                active_requests: 2,
                completed_requests: 2,
                total_spent_cents: 30_000,
            }
        );
        let ids: Vec<DbId> = stats.recent_requests.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn accepted_and_awaiting_are_not_dashboard_active() {
        let stats = summarize(
            vec![
                row(1, RequestStatus::Accepted, 100, 2),
                row(2, RequestStatus::AwaitingConfirmation, 100, 1),
            ],
            DEFAULT_RECENT_LIMIT,
        );
        assert_eq!(stats.summary.total_requests, 2);
        assert_eq!(stats.summary.active_requests, 0);
        assert_eq!(stats.summary.total_spent_cents, 0);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = summarize(Vec::new(), 5);
        assert_eq!(stats.summary, StatsSummary::default());
        assert!(stats.recent_requests.is_empty());
    }

    #[test]
    fn recent_limit_zero_returns_no_rows() {
        let stats = summarize(vec![row(1, RequestStatus::Pending, 1, 1)], 0);
        assert_eq!(stats.summary.total_requests, 1);
        assert!(stats.recent_requests.is_empty());
    }
}
