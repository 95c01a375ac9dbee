#![cfg(test)]
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use bmcfleet_common::config::{DiscoveryConfig, DISCOVERY_HARD_CAP};
use bmcfleet_common::credential::{Credential, CredentialList};
use bmcfleet_common::device::ScanReport;
use bmcfleet_common::fleet::{FleetMember, MemberId};
use bmcfleet_core::discovery::DiscoveryCoordinator;
use bmcfleet_core::inventory::MemoryInventory;
use bmcfleet_core::network::tcp::TcpReachability;
use tokio::net::TcpListener;

use crate::util::{credentials, ip, SimController, SimulatedFleet};

fn coordinator(fleet: Arc<SimulatedFleet>, known: Vec<FleetMember>) -> DiscoveryCoordinator {
    DiscoveryCoordinator::new(
        fleet.clone(),
        fleet,
        Arc::new(MemoryInventory::new(known)),
        credentials(),
    )
}

fn sorted(mut report: ScanReport) -> ScanReport {
    report.devices.sort_by_key(|device| device.address);
    report
}

/// A /24 with a handful of controllers, one of them already inventoried.
#[tokio::test(start_paused = true)]
async fn discovery_over_class_c() -> anyhow::Result<()> {
    let fleet = Arc::new(
        SimulatedFleet::new()
            .with(ip(10, 9, 0, 10), SimController::open("root"))
            .with(ip(10, 9, 0, 11), SimController::open("ADMIN"))
            .with(ip(10, 9, 0, 12), SimController::open("Administrator"))
            .with(ip(10, 9, 0, 13), SimController::locked())
            .with(ip(10, 9, 0, 200), SimController::open("root")),
    );
    let known = vec![FleetMember {
        id: MemberId(42),
        address: IpAddr::V4(ip(10, 9, 0, 200)),
        port: 443,
        credential: Credential::new("root", "calvin", 0),
    }];
    let discovery = coordinator(fleet.clone(), known);

    let report = sorted(
        discovery
            .discover("10.9.0.0/24", 443, Duration::from_secs(2), 20)
            .await?,
    );

    assert_eq!(report.total_scanned, 254);
    assert_eq!(report.devices_found, 5);
    assert_eq!(report.accessible().count(), 4);
    assert_eq!(report.needing_auth().count(), 1);
    assert_eq!(report.incomplete, 0);
    assert!(fleet.peak() <= 20);

    let users: Vec<Option<&str>> = report
        .devices
        .iter()
        .map(|d| d.credential.as_ref().map(|c| c.username.as_str()))
        .collect();
    assert_eq!(
        users,
        vec![Some("root"), Some("ADMIN"), Some("Administrator"), None, Some("root")]
    );

    let known = report.devices.last().unwrap();
    assert!(known.already_exists);
    assert_eq!(known.existing_id, Some(MemberId(42)));
    assert_eq!(report.devices.iter().filter(|d| d.already_exists).count(), 1);
    Ok(())
}

/// Each controller sees only the credentials ranked up to the one it accepts.
#[tokio::test(start_paused = true)]
async fn discovery_stops_at_first_accepted_credential() -> anyhow::Result<()> {
    let fleet = Arc::new(
        SimulatedFleet::new()
            .with(ip(10, 9, 1, 1), SimController::open("root"))
            .with(ip(10, 9, 1, 2), SimController::open("ADMIN"))
            .with(ip(10, 9, 1, 3), SimController::open("Administrator"))
            .with(ip(10, 9, 1, 4), SimController::locked()),
    );
    let discovery = coordinator(fleet.clone(), vec![]);

    discovery
        .discover("10.9.1.1-10.9.1.4", 443, Duration::from_secs(2), 4)
        .await?;

    // 1 + 2 + 3 attempts for the open controllers, all 3 for the locked one.
    assert_eq!(fleet.calls(), 9);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn discovery_width_is_hard_capped() -> anyhow::Result<()> {
    let fleet = (1..=250u8).fold(SimulatedFleet::new(), |fleet, n| {
        fleet.with(
            ip(10, 9, 2, n),
            SimController::slow("root", Duration::from_millis(500)),
        )
    });
    let fleet = Arc::new(fleet);
    let discovery = coordinator(fleet.clone(), vec![]);

    let cfg = DiscoveryConfig {
        max_workers: 1_000,
        ..DiscoveryConfig::default()
    };
    let report = discovery.discover_with("10.9.2.0/24", &cfg).await?;

    assert_eq!(report.devices_found, 250);
    assert!(fleet.peak() <= DISCOVERY_HARD_CAP, "peak was {}", fleet.peak());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn discovery_survives_a_hung_controller() -> anyhow::Result<()> {
    let fleet = Arc::new(
        SimulatedFleet::new()
            .with(ip(10, 9, 3, 1), SimController::open("root"))
            .with(ip(10, 9, 3, 2), SimController::hung()),
    );
    let discovery = coordinator(fleet, vec![]);

    let report = discovery
        .discover("10.9.3.1,10.9.3.2", 443, Duration::from_secs(3), 2)
        .await?;

    assert_eq!(report.total_scanned, 2);
    assert_eq!(report.accessible().count(), 1);
    assert_eq!(report.needing_auth().count(), 1);
    Ok(())
}

#[tokio::test]
async fn discovery_is_idempotent() -> anyhow::Result<()> {
    let fleet = Arc::new(
        SimulatedFleet::new()
            .with(ip(10, 9, 4, 3), SimController::open("ADMIN"))
            .with(ip(10, 9, 4, 9), SimController::locked()),
    );
    let discovery = coordinator(fleet, vec![]);

    let first = sorted(discovery.discover("10.9.4.0/28", 443, Duration::from_secs(1), 5).await?);
    let second = sorted(discovery.discover("10.9.4.0/28", 443, Duration::from_secs(1), 5).await?);

    assert_eq!(first.devices, second.devices);
    assert_eq!(first.total_scanned, second.total_scanned);
    Ok(())
}

/// Real TCP handshakes against loopback: only the address with a listener is probed.
#[tokio::test]
async fn discovery_with_tcp_reachability_on_loopback() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let fleet = Arc::new(
        SimulatedFleet::new()
            .with(ip(127, 0, 0, 1), SimController::open("root"))
            .with(ip(127, 0, 0, 2), SimController::open("root")),
    );
    let discovery = DiscoveryCoordinator::new(
        fleet.clone(),
        Arc::new(TcpReachability),
        Arc::new(MemoryInventory::default()),
        CredentialList::new(vec![Credential::new("root", "calvin", 0)]),
    );

    let report = discovery
        .discover("127.0.0.1-127.0.0.3", port, Duration::from_secs(1), 3)
        .await?;

    assert_eq!(report.total_scanned, 3);
    assert_eq!(report.devices_found, 1);
    assert_eq!(report.devices[0].address, ip(127, 0, 0, 1));
    assert_eq!(fleet.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn discovery_rejects_malformed_spec() {
    let fleet = Arc::new(SimulatedFleet::new());
    let discovery = coordinator(fleet.clone(), vec![]);

    for spec in ["", "10.9.5.1/33", "10.9.5.300", "10.9.5.9-10.9.5.1", "10.0.0.0/8"] {
        let result = discovery
            .discover(spec, 443, Duration::from_secs(1), 4)
            .await;
        assert!(result.is_err(), "'{spec}' should be rejected");
    }
    assert_eq!(fleet.calls(), 0);
}
