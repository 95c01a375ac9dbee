#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use bmcfleet_common::config::RefreshConfig;
use bmcfleet_common::error::{RefreshFailure, RemoteError};
use bmcfleet_common::fleet::{MemberId, MemberStatus};
use bmcfleet_common::power::{PowerAction, PowerState};
use bmcfleet_core::control::PowerController;
use bmcfleet_core::inventory::MemoryInventory;
use bmcfleet_core::refresh::power::{PowerStateJob, PowerStateRefresh};
use bmcfleet_core::refresh::telemetry::{TelemetryJob, TelemetryRefresh};
use tokio::sync::{watch, Semaphore};

use crate::util::{fleet_for, ip, members, SimController};

fn config(concurrency: usize, per_member_timeout: Duration) -> RefreshConfig {
    RefreshConfig {
        interval: Duration::from_secs(60),
        per_member_timeout,
        concurrency,
        safety_margin: 2,
    }
}

/// Fifty members, eight at a time, one of them never answers.
#[tokio::test(start_paused = true)]
async fn power_pass_over_large_fleet() -> anyhow::Result<()> {
    let fleet = Arc::new(fleet_for(50).with(ip(10, 20, 0, 17), SimController::hung()));
    let inventory = Arc::new(MemoryInventory::new(members(50)));
    let runner = PowerStateRefresh::new(
        PowerStateJob,
        fleet.clone(),
        inventory.clone(),
        config(8, Duration::from_secs(10)),
    );

    let result = runner
        .trigger_now()
        .await?
        .completed()
        .expect("pass should run");

    assert_eq!(result.total, 50);
    assert_eq!(result.succeeded, 49);
    assert_eq!(result.failed, 1);
    assert!(!result.timed_out);
    assert!(fleet.peak() <= 8);
    assert_eq!(
        result.outcome_for(MemberId(17)).unwrap().error,
        Some(RefreshFailure::Remote(RemoteError::Timeout(Duration::from_secs(10))))
    );

    let hung = inventory.state(MemberId(17)).unwrap();
    assert_eq!(hung.status, MemberStatus::Offline);
    let healthy = inventory.state(MemberId(18)).unwrap();
    assert_eq!(healthy.status, MemberStatus::Online);
    assert_eq!(healthy.power_state, PowerState::On);
    Ok(())
}

/// A stuck power pass neither blocks nor is blocked by the telemetry runner.
#[tokio::test]
async fn runners_of_different_kinds_are_independent() -> anyhow::Result<()> {
    let gate = Arc::new(Semaphore::new(0));
    let gated = Arc::new(fleet_for(3).gated(gate.clone()));
    let open = Arc::new(fleet_for(3));
    let inventory = Arc::new(MemoryInventory::new(members(3)));

    let power = Arc::new(PowerStateRefresh::new(
        PowerStateJob,
        gated.clone(),
        inventory.clone(),
        config(4, Duration::from_secs(10)),
    ));
    let telemetry = TelemetryRefresh::new(
        TelemetryJob,
        open,
        inventory.clone(),
        config(4, Duration::from_secs(10)),
    );

    let stuck = tokio::spawn({
        let power = power.clone();
        async move { power.trigger_now().await }
    });
    while gated.calls() < 3 {
        tokio::task::yield_now().await;
    }

    assert!(power.trigger_now().await?.is_skipped());
    let readings = telemetry.trigger_now().await?.completed().expect("telemetry should run");
    assert_eq!(readings.succeeded, 3);
    assert!(inventory.state(MemberId(1)).unwrap().telemetry.is_some());

    gate.add_permits(3);
    let finished = stuck.await??.completed().expect("power pass should finish");
    assert_eq!(finished.succeeded, 3);
    Ok(())
}

/// A tick landing on a running pass is dropped, not queued.
#[tokio::test(start_paused = true)]
async fn schedule_skips_ticks_during_slow_pass() -> anyhow::Result<()> {
    let fleet = (1..=2u8).fold(crate::util::SimulatedFleet::new(), |fleet, n| {
        fleet.with(ip(10, 20, 0, n), SimController::slow("root", Duration::from_secs(90)))
    });
    let fleet = Arc::new(fleet);
    let runner = Arc::new(PowerStateRefresh::new(
        PowerStateJob,
        fleet.clone(),
        Arc::new(MemoryInventory::new(members(2))),
        config(2, Duration::from_secs(120)),
    ));
    let (stop, shutdown) = watch::channel(false);

    let schedule = runner.clone().spawn_schedule(Duration::from_secs(60), shutdown);
    tokio::time::sleep(Duration::from_secs(200)).await;

    // Passes started at 0s and 120s; the 60s tick found the first one running.
    assert_eq!(fleet.calls(), 4);
    let status = runner.status();
    assert!(status.running);
    assert_eq!(status.last_pass.map(|pass| pass.succeeded), Some(2));

    stop.send(true)?;
    schedule.await?;
    Ok(())
}

/// A power action is visible to the next power refresh pass.
#[tokio::test(start_paused = true)]
async fn power_action_then_refresh() -> anyhow::Result<()> {
    let fleet = Arc::new(fleet_for(4));
    let inventory = Arc::new(MemoryInventory::new(members(4)));
    let cfg = config(4, Duration::from_secs(10));

    let controller = PowerController::new(fleet.clone(), inventory.clone(), &cfg);
    let results = controller
        .execute_many(vec![MemberId(2), MemberId(3)], PowerAction::Off)
        .await;
    assert!(results.iter().all(|(_, result)| *result == Ok(PowerState::Off)));
    assert_eq!(fleet.power_of(ip(10, 20, 0, 2)), PowerState::Off);

    let runner = PowerStateRefresh::new(PowerStateJob, fleet, inventory.clone(), cfg);
    runner.trigger_now().await?;

    let powers: Vec<PowerState> = (1..=4)
        .map(|n| inventory.state(MemberId(n)).unwrap().power_state)
        .collect();
    assert_eq!(
        powers,
        vec![PowerState::On, PowerState::Off, PowerState::Off, PowerState::On]
    );
    Ok(())
}
