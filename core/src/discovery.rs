//! # Controller Discovery
//!
//! Implements the "find every management controller in this address space" use case.
//!
//! The coordinator expands an address specification into targets, probes them with
//! bounded concurrency, and cross-references every controller that answered against
//! the inventory. A single target failing never fails the run; only a malformed
//! specification does.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use bmcfleet_common::config::{DEFAULT_SAFETY_MARGIN, DISCOVERY_HARD_CAP, DiscoveryConfig};
use bmcfleet_common::credential::CredentialList;
use bmcfleet_common::device::{DeviceRecord, ScanReport};
use bmcfleet_common::error::DiscoveryError;
use bmcfleet_common::fleet::MemberId;
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::inventory::InventoryStore;
use bmcfleet_common::network::reachability::Reachability;
use bmcfleet_common::network::target::AddressSpec;
use tokio::time;
use tracing::{debug, info, warn};

use crate::batch::{self, run_bounded};
use crate::probe::CredentialProber;

/// Called once per probed target, responded or not, as probes finish.
pub type ProbeObserver = Arc<dyn Fn(&DeviceRecord) + Send + Sync>;

/// Application service for controller discovery.
///
/// Orchestrates a run by:
/// 1. expanding the address specification into [`ScanTarget`](bmcfleet_common::network::target::ScanTarget)s.
/// 2. delegating each probe to the [`CredentialProber`].
/// 3. stamping inventory matches onto the records that answered.
pub struct DiscoveryCoordinator {
    prober: CredentialProber,
    inventory: Arc<dyn InventoryStore>,
    credentials: Arc<CredentialList>,
    observer: Option<ProbeObserver>,
}

impl DiscoveryCoordinator {
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        reachability: Arc<dyn Reachability>,
        inventory: Arc<dyn InventoryStore>,
        credentials: CredentialList,
    ) -> Self {
        Self {
            prober: CredentialProber::new(gateway, reachability),
            inventory,
            credentials: Arc::new(credentials),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: ProbeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Scans `spec` on `port` with at most `max_workers` probes in flight.
    ///
    /// `max_workers` is clamped to the discovery hard cap.
    pub async fn discover(
        &self,
        spec: &str,
        port: u16,
        timeout: Duration,
        max_workers: usize,
    ) -> Result<ScanReport, DiscoveryError> {
        let cfg = DiscoveryConfig {
            port,
            timeout,
            max_workers,
            hard_cap: DISCOVERY_HARD_CAP,
        };
        self.discover_with(spec, &cfg).await
    }

    pub async fn discover_with(
        &self,
        spec: &str,
        cfg: &DiscoveryConfig,
    ) -> Result<ScanReport, DiscoveryError> {
        let addresses: AddressSpec = spec.parse()?;
        Ok(self.discover_addresses(&addresses, cfg).await)
    }

    /// Runs discovery over an already parsed [`AddressSpec`].
    pub async fn discover_addresses(
        &self,
        addresses: &AddressSpec,
        cfg: &DiscoveryConfig,
    ) -> ScanReport {
        let targets = addresses.to_targets(cfg.port);
        let total_scanned = targets.len();

        let workers = cfg.effective_workers();
        let deadline = batch::pass_deadline(
            total_scanned,
            workers,
            DEFAULT_SAFETY_MARGIN,
            self.per_target_budget(cfg.timeout),
        );

        info!(
            %addresses,
            targets = total_scanned,
            workers,
            credentials = self.credentials.len(),
            "starting discovery"
        );

        let timeout = cfg.timeout;
        let outcome = run_bounded(targets, workers, deadline, |target| {
            let prober = self.prober.clone();
            let inventory = self.inventory.clone();
            let credentials = self.credentials.clone();
            let observer = self.observer.clone();
            async move {
                let record = prober.probe(&target, &credentials, timeout).await;
                if let Some(observer) = &observer {
                    observer(&record);
                }
                if !record.responded() {
                    return None;
                }
                let existing = cross_reference(inventory.as_ref(), &record, timeout).await;
                Some(record.with_inventory_match(existing))
            }
        })
        .await;

        let incomplete = outcome.incomplete();
        if incomplete > 0 {
            warn!(incomplete, "some targets did not finish probing");
        }

        let devices: Vec<DeviceRecord> = outcome.completed.into_iter().flatten().collect();
        let report = ScanReport::new(total_scanned, devices, incomplete, outcome.elapsed);

        info!(
            scanned = report.total_scanned,
            found = report.devices_found,
            accessible = report.accessible().count(),
            elapsed_ms = report.duration.as_millis() as u64,
            "discovery finished"
        );
        report
    }

    /// Worst case for one target: the reachability check, one attempt per
    /// credential, and the inventory lookup.
    fn per_target_budget(&self, timeout: Duration) -> Duration {
        let steps = u32::try_from(self.credentials.len())
            .unwrap_or(u32::MAX)
            .saturating_add(2);
        timeout.saturating_mul(steps)
    }
}

/// A failed or slow lookup is treated as "not in inventory".
async fn cross_reference(
    inventory: &dyn InventoryStore,
    record: &DeviceRecord,
    timeout: Duration,
) -> Option<MemberId> {
    let address = IpAddr::from(record.address);
    match time::timeout(timeout, inventory.find_by_address(address)).await {
        Ok(Ok(found)) => found.map(|member| member.id),
        Ok(Err(err)) => {
            warn!(%address, "inventory lookup failed: {err}");
            None
        }
        Err(_) => {
            debug!(%address, "inventory lookup timed out");
            None
        }
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
