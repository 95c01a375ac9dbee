//! Operator-initiated power actions against inventoried members.

use std::sync::Arc;
use std::time::Duration;

use bmcfleet_common::config::{DEFAULT_SAFETY_MARGIN, RefreshConfig};
use bmcfleet_common::error::{InventoryError, PowerActionError, RemoteError};
use bmcfleet_common::fleet::{MemberId, MemberStateUpdate};
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::inventory::InventoryStore;
use bmcfleet_common::power::{PowerAction, PowerState};
use chrono::Utc;
use tokio::time;
use tracing::{info, warn};

use crate::batch::{self, run_bounded};

pub type ActionResult = (MemberId, Result<PowerState, PowerActionError>);

pub struct PowerController {
    gateway: Arc<dyn CommandGateway>,
    inventory: Arc<dyn InventoryStore>,
    timeout: Duration,
    concurrency: usize,
}

impl PowerController {
    /// Uses the per-member timeout and concurrency of `config`.
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        inventory: Arc<dyn InventoryStore>,
        config: &RefreshConfig,
    ) -> Self {
        Self {
            gateway,
            inventory,
            timeout: config.per_member_timeout,
            concurrency: config.concurrency,
        }
    }

    /// Sends `action` to member `id` and records the state it settles in.
    ///
    /// Returns that expected state once the controller acknowledged.
    pub async fn execute(
        &self,
        id: MemberId,
        action: PowerAction,
    ) -> Result<PowerState, PowerActionError> {
        apply_action(
            self.gateway.as_ref(),
            self.inventory.as_ref(),
            id,
            action,
            self.timeout,
        )
        .await
    }

    /// Runs `action` against every id with bounded concurrency.
    ///
    /// The result holds one entry per id, in completion order.
    pub async fn execute_many(&self, ids: Vec<MemberId>, action: PowerAction) -> Vec<ActionResult> {
        let deadline =
            batch::pass_deadline(ids.len(), self.concurrency, DEFAULT_SAFETY_MARGIN, self.timeout);
        let timeout = self.timeout;

        let outcome = run_bounded(ids.clone(), self.concurrency, deadline, |id| {
            let gateway = self.gateway.clone();
            let inventory = self.inventory.clone();
            async move {
                let result =
                    apply_action(gateway.as_ref(), inventory.as_ref(), id, action, timeout).await;
                (id, result)
            }
        })
        .await;

        let mut results = outcome.completed;
        for position in outcome.abandoned.iter().chain(outcome.panicked.iter()) {
            if let Some(&id) = ids.get(*position) {
                results.push((id, Err(PowerActionError::Incomplete)));
            }
        }
        results
    }
}

async fn apply_action(
    gateway: &dyn CommandGateway,
    inventory: &dyn InventoryStore,
    id: MemberId,
    action: PowerAction,
    timeout: Duration,
) -> Result<PowerState, PowerActionError> {
    let member = inventory
        .get_member(id)
        .await?
        .ok_or(InventoryError::NotFound(id))?;

    let endpoint = member.endpoint();
    let acked = time::timeout(
        timeout,
        gateway.set_power_state(&endpoint, &member.credential, action, timeout),
    )
    .await
    .unwrap_or(Err(RemoteError::Timeout(timeout)));

    if let Err(err) = acked {
        warn!(member = %id, %endpoint, %action, "power action failed: {err}");
        let update = MemberStateUpdate::unknown().with_power(PowerState::Unknown);
        if let Err(write_err) = inventory.update_member_state(id, update).await {
            warn!(member = %id, "could not record failed action: {write_err}");
        }
        return Err(err.into());
    }

    let expected = action.expected_state();
    inventory
        .update_member_state(id, MemberStateUpdate::online(Utc::now()).with_power(expected))
        .await?;

    info!(member = %id, %endpoint, %action, power = %expected, "power action acknowledged");
    Ok(expected)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
