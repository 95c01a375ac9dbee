use std::time::Duration;

use async_trait::async_trait;
use bmcfleet_common::error::RemoteError;
use bmcfleet_common::fleet::{FleetMember, MemberStateUpdate, TelemetryUpdate};
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::telemetry::SensorReadings;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{RefreshJob, RefreshPassRunner};

/// Collects sensor readings from each member.
///
/// A failed read leaves the member's status unknown and drops its stale readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryJob;

pub type TelemetryRefresh = RefreshPassRunner<TelemetryJob>;

#[async_trait]
impl RefreshJob for TelemetryJob {
    type Reading = SensorReadings;

    const KIND: &'static str = "telemetry";

    async fn fetch(
        &self,
        gateway: &dyn CommandGateway,
        member: &FleetMember,
        timeout: Duration,
    ) -> Result<SensorReadings, RemoteError> {
        let readings = gateway
            .get_sensor_readings(&member.endpoint(), &member.credential, timeout)
            .await?;

        let summary = readings.summary();
        debug!(
            member = %member.id,
            max_temperature = ?summary.max_temperature,
            min_voltage = ?summary.min_voltage,
            max_voltage = ?summary.max_voltage,
            stalled_fans = summary.stalled_fans,
            "sensor readings collected"
        );
        Ok(readings)
    }

    fn on_success(&self, reading: SensorReadings, seen_at: DateTime<Utc>) -> MemberStateUpdate {
        MemberStateUpdate::online(seen_at).with_telemetry(TelemetryUpdate::Replace(reading))
    }

    fn on_failure(&self, _error: &RemoteError) -> MemberStateUpdate {
        MemberStateUpdate::unknown().with_telemetry(TelemetryUpdate::Clear)
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
