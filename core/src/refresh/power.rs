use std::time::Duration;

use async_trait::async_trait;
use bmcfleet_common::error::RemoteError;
use bmcfleet_common::fleet::{FleetMember, MemberStateUpdate};
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::power::PowerState;
use chrono::{DateTime, Utc};

use super::{RefreshJob, RefreshPassRunner};

/// Polls each member's power state.
///
/// An unreachable member is marked offline with an unknown power state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerStateJob;

pub type PowerStateRefresh = RefreshPassRunner<PowerStateJob>;

#[async_trait]
impl RefreshJob for PowerStateJob {
    type Reading = PowerState;

    const KIND: &'static str = "power";

    async fn fetch(
        &self,
        gateway: &dyn CommandGateway,
        member: &FleetMember,
        timeout: Duration,
    ) -> Result<PowerState, RemoteError> {
        gateway
            .get_power_state(&member.endpoint(), &member.credential, timeout)
            .await
    }

    fn on_success(&self, reading: PowerState, seen_at: DateTime<Utc>) -> MemberStateUpdate {
        MemberStateUpdate::online(seen_at).with_power(reading)
    }

    fn on_failure(&self, _error: &RemoteError) -> MemberStateUpdate {
        MemberStateUpdate::offline().with_power(PowerState::Unknown)
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
