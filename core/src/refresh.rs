//! # Periodic Refresh Engine
//!
//! A [`RefreshPassRunner`] snapshots the fleet, refreshes every member with bounded
//! concurrency and folds the results back into the inventory. What is fetched and how
//! it is folded is supplied by a [`RefreshJob`]; the runner owns the scheduling,
//! overlap prevention and aggregation.
//!
//! Passes of the same runner never overlap. A trigger arriving while a pass is in
//! flight is skipped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bmcfleet_common::config::RefreshConfig;
use bmcfleet_common::error::{InventoryError, RefreshError, RefreshFailure, RemoteError};
use bmcfleet_common::fleet::{FleetMember, FleetSnapshot, MemberStateUpdate};
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::inventory::InventoryStore;
use bmcfleet_common::refresh::{RefreshOutcome, RefreshPassResult, RunnerStatus, TriggerResult};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::batch::{self, run_bounded};

pub mod power;
pub mod telemetry;

/// Shortest period [`RefreshPassRunner::spawn_schedule`] will tick at.
pub const MIN_SCHEDULE_PERIOD: Duration = Duration::from_millis(1);

/// One kind of periodic refresh.
#[async_trait]
pub trait RefreshJob: Send + Sync + 'static {
    type Reading: Send + 'static;

    /// Short name used in logs and pass results.
    const KIND: &'static str;

    async fn fetch(
        &self,
        gateway: &dyn CommandGateway,
        member: &FleetMember,
        timeout: Duration,
    ) -> Result<Self::Reading, RemoteError>;

    fn on_success(&self, reading: Self::Reading, seen_at: DateTime<Utc>) -> MemberStateUpdate;

    fn on_failure(&self, error: &RemoteError) -> MemberStateUpdate;
}

/// Held for the lifetime of one pass. Dropping it releases the runner.
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct History {
    last_pass: Option<RefreshPassResult>,
    next_scheduled_at: Option<DateTime<Utc>>,
}

pub struct RefreshPassRunner<J: RefreshJob> {
    job: Arc<J>,
    gateway: Arc<dyn CommandGateway>,
    inventory: Arc<dyn InventoryStore>,
    config: RefreshConfig,
    in_flight: AtomicBool,
    history: Mutex<History>,
}

impl<J: RefreshJob> RefreshPassRunner<J> {
    pub fn new(
        job: J,
        gateway: Arc<dyn CommandGateway>,
        inventory: Arc<dyn InventoryStore>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            job: Arc::new(job),
            gateway,
            inventory,
            config,
            in_flight: AtomicBool::new(false),
            history: Mutex::new(History::default()),
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Runs one pass now, or returns [`TriggerResult::Skipped`] if one is in flight.
    ///
    /// Only a failed fleet snapshot is an error. Per-member failures are reported
    /// inside the pass result.
    pub async fn trigger_now(&self) -> Result<TriggerResult, RefreshError> {
        let Some(_guard) = PassGuard::acquire(&self.in_flight) else {
            warn!(kind = J::KIND, "previous pass still running, trigger skipped");
            return Ok(TriggerResult::Skipped);
        };

        let span = info_span!("refresh_pass", kind = J::KIND);
        let result = self.run_pass().instrument(span).await?;

        self.history().last_pass = Some(result.clone());
        Ok(TriggerResult::Completed(result))
    }

    pub fn status(&self) -> RunnerStatus {
        let history = self.history();
        RunnerStatus {
            kind: J::KIND,
            running: self.in_flight.load(Ordering::Acquire),
            last_pass: history.last_pass.clone(),
            next_scheduled_at: history.next_scheduled_at,
        }
    }

    /// Triggers a pass every `period` until `shutdown` flips to `true` or its
    /// sender is dropped. The first pass starts immediately. `period` is raised
    /// to [`MIN_SCHEDULE_PERIOD`] if shorter.
    ///
    /// Each tick spawns its own pass, so a tick that lands on a running pass is
    /// skipped by the guard instead of delaying the schedule.
    pub fn spawn_schedule(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        if period < MIN_SCHEDULE_PERIOD {
            warn!(kind = J::KIND, ?period, "schedule period too short, clamping");
        }
        let period = period.max(MIN_SCHEDULE_PERIOD);
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(kind = J::KIND, period_ms = period.as_millis() as u64, "scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.mark_next_run(period);
                        let runner = self.clone();
                        tokio::spawn(async move {
                            if let Err(err) = runner.trigger_now().await {
                                error!(kind = J::KIND, "scheduled pass failed: {err}");
                            }
                        });
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            self.history().next_scheduled_at = None;
            info!(kind = J::KIND, "scheduler stopped");
        })
    }

    fn mark_next_run(&self, period: Duration) {
        let next = chrono::Duration::from_std(period)
            .ok()
            .and_then(|step| Utc::now().checked_add_signed(step));
        self.history().next_scheduled_at = next;
    }

    fn history(&self) -> std::sync::MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn take_snapshot(&self) -> Result<FleetSnapshot, RefreshError> {
        let listing = time::timeout(
            self.config.per_member_timeout,
            self.inventory.list_fleet_members(),
        )
        .await
        .unwrap_or_else(|_| Err(InventoryError::Backend("fleet listing timed out".into())));

        listing.map(FleetSnapshot::new).map_err(|err| {
            error!(kind = J::KIND, "fleet snapshot failed: {err}");
            RefreshError::Snapshot(err)
        })
    }

    async fn run_pass(&self) -> Result<RefreshPassResult, RefreshError> {
        let started_at = Utc::now();
        let snapshot = self.take_snapshot().await?;
        let ids = snapshot.ids();

        let timeout = self.config.per_member_timeout;
        let deadline = batch::pass_deadline(
            snapshot.len(),
            self.config.concurrency,
            self.config.safety_margin,
            timeout,
        );
        debug!(members = snapshot.len(), deadline_ms = deadline.as_millis() as u64, "snapshot taken");

        let outcome = run_bounded(
            snapshot.into_members(),
            self.config.concurrency,
            deadline,
            |member| {
                let job = self.job.clone();
                let gateway = self.gateway.clone();
                let inventory = self.inventory.clone();
                async move {
                    refresh_member(job.as_ref(), gateway.as_ref(), inventory.as_ref(), &member, timeout)
                        .await
                }
            },
        )
        .await;

        let timed_out = outcome.timed_out();
        let elapsed = outcome.elapsed;
        let mut outcomes = outcome.completed;

        let unfinished = outcome
            .abandoned
            .iter()
            .map(|&position| (position, RefreshFailure::PassTimeout))
            .chain(
                outcome
                    .panicked
                    .iter()
                    .map(|&position| (position, RefreshFailure::Panicked)),
            );
        for (position, failure) in unfinished {
            if let Some(&member) = ids.get(position) {
                outcomes.push(RefreshOutcome::failure(member, failure, elapsed));
            }
        }

        let result = RefreshPassResult::from_outcomes(J::KIND, started_at, elapsed, timed_out, outcomes);
        if result.timed_out {
            warn!(
                total = result.total,
                failed = result.failed,
                "pass deadline expired, unfinished members abandoned"
            );
        }
        info!(
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "pass finished"
        );
        Ok(result)
    }
}

async fn refresh_member<J: RefreshJob>(
    job: &J,
    gateway: &dyn CommandGateway,
    inventory: &dyn InventoryStore,
    member: &FleetMember,
    timeout: Duration,
) -> RefreshOutcome {
    let started = Instant::now();

    let fetched = time::timeout(timeout, job.fetch(gateway, member, timeout))
        .await
        .unwrap_or(Err(RemoteError::Timeout(timeout)));

    let (update, failure) = match fetched {
        Ok(reading) => (job.on_success(reading, Utc::now()), None),
        Err(err) => {
            debug!(member = %member.id, address = %member.address, "refresh failed: {err}");
            (job.on_failure(&err), Some(RefreshFailure::Remote(err)))
        }
    };

    if let Err(err) = inventory.update_member_state(member.id, update).await {
        warn!(member = %member.id, "state write rejected: {err}");
        let failure = failure.unwrap_or(RefreshFailure::Inventory(err));
        return RefreshOutcome::failure(member.id, failure, started.elapsed());
    }

    match failure {
        None => RefreshOutcome::success(member.id, started.elapsed()),
        Some(failure) => RefreshOutcome::failure(member.id, failure, started.elapsed()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
