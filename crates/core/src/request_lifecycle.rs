//! Service request state machine and auto-confirmation rules.
//!
//! This module lives in `core` (zero internal deps) so the transition table
//! is shared by every store implementation and by the worker.
//!
//! ```text
//! pending -> accepted -> in_progress -> awaiting_confirmation -> completed
//!    |          |
//!    +----------+--> rejected
//! (any non-terminal) --> cancelled
//! ```

use chrono::Duration;

use crate::error::CoreError;
use crate::status::RequestStatus;
use crate::types::Timestamp;

/// Hours a request may sit in `awaiting_confirmation` before the sweeper
/// confirms it on the client's behalf.
pub const AUTO_CONFIRM_AFTER_HOURS: i64 = 24;

/// Statuses that block a new request for the same (client, expert, service).
pub const ACTIVE_STATUSES: [RequestStatus; 4] = [
    RequestStatus::Pending,
    RequestStatus::Accepted,
    RequestStatus::InProgress,
    RequestStatus::AwaitingConfirmation,
];

/// Statuses counted as "active" in client/expert dashboards.
///
/// Narrower than [`ACTIVE_STATUSES`]: accepted and awaiting-confirmation
/// requests are not counted.
pub const DASHBOARD_ACTIVE_STATUSES: [RequestStatus; 2] =
    [RequestStatus::Pending, RequestStatus::InProgress];

impl RequestStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }

    /// Whether a request in this status blocks a duplicate request.
    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }

    /// Returns the set of statuses reachable from `self`.
    pub fn valid_transitions(self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            Pending => &[Accepted, Rejected, Cancelled],
            Accepted => &[InProgress, Rejected, Cancelled],
            InProgress => &[AwaitingConfirmation, Cancelled],
            AwaitingConfirmation => &[Completed, Cancelled],
            Completed | Rejected | Cancelled => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is legal.
    pub fn can_transition_to(self, to: RequestStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

/// A requested change of status, carrying the data the target state records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Expert accepts a pending request.
    Accept { reason: Option<String> },
    /// Expert declines a pending or accepted request.
    Reject { reason: Option<String> },
    /// Work starts (payment secured); stamps `start_date`.
    Start,
    /// Expert reports the work done; starts the confirmation window.
    MarkExpertCompleted,
    /// Client (or the sweeper on the client's behalf) confirms completion.
    Confirm,
    /// Either party withdraws a non-terminal request.
    Cancel { reason: Option<String> },
}

impl Transition {
    /// Status the request ends up in.
    pub fn target(&self) -> RequestStatus {
        match self {
            Transition::Accept { .. } => RequestStatus::Accepted,
            Transition::Reject { .. } => RequestStatus::Rejected,
            Transition::Start => RequestStatus::InProgress,
            Transition::MarkExpertCompleted => RequestStatus::AwaitingConfirmation,
            Transition::Confirm => RequestStatus::Completed,
            Transition::Cancel { .. } => RequestStatus::Cancelled,
        }
    }

    /// Verb used in logs and error messages.
    pub fn action(&self) -> &'static str {
        match self {
            Transition::Accept { .. } => "accept",
            Transition::Reject { .. } => "reject",
            Transition::Start => "start",
            Transition::MarkExpertCompleted => "mark completed",
            Transition::Confirm => "confirm",
            Transition::Cancel { .. } => "cancel",
        }
    }

    /// Build the transition that moves a request into `target`.
    ///
    /// `pending` is only reachable through creation, so it has no transition.
    pub fn into_status(target: RequestStatus, reason: Option<String>) -> Option<Self> {
        match target {
            RequestStatus::Pending => None,
            RequestStatus::Accepted => Some(Transition::Accept { reason }),
            RequestStatus::Rejected => Some(Transition::Reject { reason }),
            RequestStatus::InProgress => Some(Transition::Start),
            RequestStatus::AwaitingConfirmation => Some(Transition::MarkExpertCompleted),
            RequestStatus::Completed => Some(Transition::Confirm),
            RequestStatus::Cancelled => Some(Transition::Cancel { reason }),
        }
    }

    /// Validate this transition against the current status.
    pub fn check(&self, current: RequestStatus) -> Result<(), CoreError> {
        if current.can_transition_to(self.target()) {
            Ok(())
        } else {
            Err(CoreError::InvalidState {
                action: self.action(),
                current,
            })
        }
    }
}

/// Completion timestamps at or before this instant are due for auto-confirmation.
pub fn auto_confirm_cutoff(now: Timestamp, after_hours: i64) -> Timestamp {
    now - Duration::hours(after_hours)
}

/// Whether a request matches the auto-confirm selection predicate.
pub fn is_auto_confirm_candidate(
    status: RequestStatus,
    expert_completed: bool,
    client_confirmed: bool,
    expert_completion_date: Option<Timestamp>,
    cutoff: Timestamp,
) -> bool {
    status == RequestStatus::AwaitingConfirmation
        && expert_completed
        && !client_confirmed
        && expert_completion_date.is_some_and(|at| at <= cutoff)
}
