//! # Refresh Pass Results

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::RefreshFailure;
use crate::fleet::MemberId;

/// Result of refreshing one member during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub member: MemberId,
    pub succeeded: bool,
    pub error: Option<RefreshFailure>,
    pub elapsed: Duration,
}

impl RefreshOutcome {
    pub fn success(member: MemberId, elapsed: Duration) -> Self {
        Self {
            member,
            succeeded: true,
            error: None,
            elapsed,
        }
    }

    pub fn failure(member: MemberId, error: RefreshFailure, elapsed: Duration) -> Self {
        Self {
            member,
            succeeded: false,
            error: Some(error),
            elapsed,
        }
    }
}

/// Aggregate result of one refresh pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshPassResult {
    pub kind: &'static str,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    /// The overall pass deadline expired and unfinished members were abandoned.
    pub timed_out: bool,
    /// Completion order.
    pub outcomes: Vec<RefreshOutcome>,
}

impl RefreshPassResult {
    pub fn from_outcomes(
        kind: &'static str,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        timed_out: bool,
        outcomes: Vec<RefreshOutcome>,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.succeeded).count();
        Self {
            kind,
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            elapsed,
            started_at,
            timed_out,
            outcomes,
        }
    }

    pub fn outcome_for(&self, member: MemberId) -> Option<&RefreshOutcome> {
        self.outcomes.iter().find(|outcome| outcome.member == member)
    }
}

/// What a trigger did.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResult {
    Completed(RefreshPassResult),
    /// A pass of the same kind was already in flight; nothing ran.
    Skipped,
}

impl TriggerResult {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TriggerResult::Skipped)
    }

    pub fn completed(self) -> Option<RefreshPassResult> {
        match self {
            TriggerResult::Completed(result) => Some(result),
            TriggerResult::Skipped => None,
        }
    }
}

/// Read-only view of a runner for operational visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerStatus {
    pub kind: &'static str,
    pub running: bool,
    pub last_pass: Option<RefreshPassResult>,
    pub next_scheduled_at: Option<DateTime<Utc>>,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
