//! # Discovery Results
//!
//! [`DeviceRecord`] is the outcome of probing one target; [`ScanReport`] aggregates
//! a whole discovery run. Neither is persisted by this crate.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::credential::Credential;
use crate::fleet::MemberId;
use crate::network::target::ScanTarget;

/// Identity fields reported by a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    pub address: Ipv4Addr,
    pub port: u16,
    /// A credential was accepted and identity fields were read.
    pub accessible: bool,
    /// The port answered but no known credential was accepted.
    pub auth_required: bool,
    pub credential: Option<Credential>,
    pub identity: Option<DeviceIdentity>,
    pub already_exists: bool,
    pub existing_id: Option<MemberId>,
}

impl DeviceRecord {
    fn blank(target: &ScanTarget) -> Self {
        Self {
            address: target.address,
            port: target.port,
            accessible: false,
            auth_required: false,
            credential: None,
            identity: None,
            already_exists: false,
            existing_id: None,
        }
    }

    /// The transport-level check failed.
    pub fn unreachable(target: &ScanTarget) -> Self {
        Self::blank(target)
    }

    /// Open port, no known credential.
    pub fn needs_auth(target: &ScanTarget) -> Self {
        Self {
            auth_required: true,
            ..Self::blank(target)
        }
    }

    pub fn identified(target: &ScanTarget, credential: Credential, identity: DeviceIdentity) -> Self {
        Self {
            accessible: true,
            credential: Some(credential),
            identity: Some(identity),
            ..Self::blank(target)
        }
    }

    /// Whether anything answered on the target port.
    pub fn responded(&self) -> bool {
        self.accessible || self.auth_required
    }

    /// Stamps the inventory cross-reference.
    pub fn with_inventory_match(mut self, existing_id: Option<MemberId>) -> Self {
        self.already_exists = existing_id.is_some();
        self.existing_id = existing_id;
        self
    }
}

/// Aggregate result of one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub total_scanned: usize,
    pub devices_found: usize,
    /// Completion order, not target order.
    pub devices: Vec<DeviceRecord>,
    /// Probes that did not finish (panicked or cut off by the batch deadline).
    pub incomplete: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl ScanReport {
    pub fn new(
        total_scanned: usize,
        devices: Vec<DeviceRecord>,
        incomplete: usize,
        duration: Duration,
    ) -> Self {
        Self {
            total_scanned,
            devices_found: devices.len(),
            devices,
            incomplete,
            duration,
        }
    }

    pub fn accessible(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter().filter(|device| device.accessible)
    }

    pub fn needing_auth(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter().filter(|device| device.auth_required)
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
