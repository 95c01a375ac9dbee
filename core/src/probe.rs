//! Credential probing of a single target.
//!
//! The ranked list is walked with an explicit loop and an early return, so the
//! "first success wins" rule can be read off the code: once a credential is
//! accepted, no lower-ranked credential is ever sent to that target.

use std::sync::Arc;
use std::time::Duration;

use bmcfleet_common::credential::CredentialList;
use bmcfleet_common::device::DeviceRecord;
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::network::endpoint::Endpoint;
use bmcfleet_common::network::reachability::Reachability;
use bmcfleet_common::network::target::ScanTarget;
use tokio::time;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CredentialProber {
    gateway: Arc<dyn CommandGateway>,
    reachability: Arc<dyn Reachability>,
}

impl CredentialProber {
    pub fn new(gateway: Arc<dyn CommandGateway>, reachability: Arc<dyn Reachability>) -> Self {
        Self {
            gateway,
            reachability,
        }
    }

    /// Probes `target` with `credentials` in rank order.
    ///
    /// Every remote step is bounded by `timeout`, so the worst case is
    /// `timeout * (1 + credentials.len())`.
    pub async fn probe(
        &self,
        target: &ScanTarget,
        credentials: &CredentialList,
        timeout: Duration,
    ) -> DeviceRecord {
        let endpoint = Endpoint::from(target);

        if !self.reachability.is_reachable(&endpoint, timeout).await {
            debug!(%endpoint, "no answer on controller port");
            return DeviceRecord::unreachable(target);
        }

        for credential in credentials {
            let attempt = self.gateway.probe_identity(&endpoint, credential, timeout);
            match time::timeout(timeout, attempt).await {
                Ok(Ok(identity)) => {
                    info!(
                        %endpoint,
                        username = %credential.username,
                        rank = credential.rank,
                        manufacturer = %identity.manufacturer,
                        model = %identity.model,
                        "controller identified"
                    );
                    return DeviceRecord::identified(target, credential.clone(), identity);
                }
                Ok(Err(err)) => {
                    debug!(%endpoint, username = %credential.username, "credential failed: {err}");
                }
                Err(_elapsed) => {
                    debug!(%endpoint, username = %credential.username, "identity probe overran its timeout");
                }
            }
        }

        debug!(%endpoint, tried = credentials.len(), "port open, no credential accepted");
        DeviceRecord::needs_auth(target)
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
