//! # Fleet Model
//!
//! Inventoried controllers, the snapshot a refresh pass works on, and the state
//! updates a pass writes back.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BMC_PORT;
use crate::credential::Credential;
use crate::network::endpoint::Endpoint;
use crate::power::PowerState;
use crate::telemetry::SensorReadings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One inventoried controller with its connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FleetMember {
    pub id: MemberId,
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    pub credential: Credential,
}

fn default_port() -> u16 {
    DEFAULT_BMC_PORT
}

impl FleetMember {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.address, self.port)
    }
}

/// Fleet membership captured once at the start of a pass.
///
/// Inventory changes made while a pass runs are only seen by the next snapshot.
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    members: Vec<FleetMember>,
    taken_at: DateTime<Utc>,
}

impl FleetSnapshot {
    pub fn new(members: Vec<FleetMember>) -> Self {
        Self {
            members,
            taken_at: Utc::now(),
        }
    }

    pub fn members(&self) -> &[FleetMember] {
        &self.members
    }

    pub fn ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|member| member.id).collect()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn into_members(self) -> Vec<FleetMember> {
        self.members
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberStatus::Online => "online",
            MemberStatus::Offline => "offline",
            MemberStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TelemetryUpdate {
    #[default]
    Unchanged,
    Replace(SensorReadings),
    Clear,
}

/// A free-standing write of one member's refreshed state.
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberStateUpdate {
    pub status: MemberStatus,
    pub power_state: Option<PowerState>,
    pub last_seen: Option<DateTime<Utc>>,
    pub telemetry: TelemetryUpdate,
}

impl MemberStateUpdate {
    pub fn online(seen_at: DateTime<Utc>) -> Self {
        Self {
            status: MemberStatus::Online,
            power_state: None,
            last_seen: Some(seen_at),
            telemetry: TelemetryUpdate::Unchanged,
        }
    }

    pub fn offline() -> Self {
        Self::with_status(MemberStatus::Offline)
    }

    pub fn unknown() -> Self {
        Self::with_status(MemberStatus::Unknown)
    }

    fn with_status(status: MemberStatus) -> Self {
        Self {
            status,
            power_state: None,
            last_seen: None,
            telemetry: TelemetryUpdate::Unchanged,
        }
    }

    pub fn with_power(mut self, power_state: PowerState) -> Self {
        self.power_state = Some(power_state);
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryUpdate) -> Self {
        self.telemetry = telemetry;
        self
    }
}

/// Last known state of one member as held by an inventory store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberState {
    pub status: MemberStatus,
    pub power_state: PowerState,
    pub last_seen: Option<DateTime<Utc>>,
    pub telemetry: Option<SensorReadings>,
}

impl MemberState {
    /// Applies `update` with last-writer-wins semantics.
    pub fn apply(&mut self, update: MemberStateUpdate) {
        self.status = update.status;
        if let Some(power_state) = update.power_state {
            self.power_state = power_state;
        }
        if let Some(last_seen) = update.last_seen {
            self.last_seen = Some(last_seen);
        }
        match update.telemetry {
            TelemetryUpdate::Unchanged => {}
            TelemetryUpdate::Replace(readings) => self.telemetry = Some(readings),
            TelemetryUpdate::Clear => self.telemetry = None,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let seen = Utc::now();
        let mut state = MemberState::default();
        state.apply(
            MemberStateUpdate::online(seen)
                .with_power(PowerState::On)
                .with_telemetry(TelemetryUpdate::Replace(SensorReadings {
                    temperature: vec![40.0],
                    ..Default::default()
                })),
        );
        assert_eq!(state.status, MemberStatus::Online);
        assert_eq!(state.power_state, PowerState::On);
        assert_eq!(state.last_seen, Some(seen));
        assert!(state.telemetry.is_some());

        state.apply(MemberStateUpdate::offline().with_power(PowerState::Unknown));
        assert_eq!(state.status, MemberStatus::Offline);
        assert_eq!(state.power_state, PowerState::Unknown);
        assert_eq!(state.last_seen, Some(seen));
        assert!(state.telemetry.is_some());

        state.apply(MemberStateUpdate::unknown().with_telemetry(TelemetryUpdate::Clear));
        assert!(state.telemetry.is_none());
    }

    #[test]
    fn test_member_deserializes_with_default_port() {
        let member: FleetMember = serde_json::from_str(
            r#"{"id": 4, "address": "10.0.0.4", "credential": {"username": "root", "password": "calvin"}}"#,
        )
        .unwrap();
        assert_eq!(member.id, MemberId(4));
        assert_eq!(member.port, DEFAULT_BMC_PORT);
        assert_eq!(member.endpoint().to_string(), "10.0.0.4:443");
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let credential = Credential::new("root", "calvin", 0);
        let members: Vec<FleetMember> = (1..=3)
            .map(|n| FleetMember {
                id: MemberId(n),
                address: IpAddr::from([10, 0, 0, n as u8]),
                port: 443,
                credential: credential.clone(),
            })
            .collect();
        let snapshot = FleetSnapshot::new(members);
        assert_eq!(snapshot.ids(), vec![MemberId(1), MemberId(2), MemberId(3)]);
        assert_eq!(snapshot.len(), 3);
    }
}
