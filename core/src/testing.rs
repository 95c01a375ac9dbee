//! Scriptable gateway and inventory doubles for unit tests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bmcfleet_common::credential::Credential;
use bmcfleet_common::device::DeviceIdentity;
use bmcfleet_common::error::{InventoryError, RemoteError};
use bmcfleet_common::fleet::{FleetMember, MemberId, MemberStateUpdate};
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::inventory::InventoryStore;
use bmcfleet_common::network::endpoint::Endpoint;
use bmcfleet_common::network::reachability::Reachability;
use bmcfleet_common::power::{PowerAction, PowerState};
use bmcfleet_common::telemetry::SensorReadings;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Healthy,
    /// Port closed.
    Closed,
    /// Port open, every credential rejected.
    Locked,
    Failing,
    Hang,
    Panic,
}

pub struct FakeGateway {
    default: Behavior,
    overrides: HashMap<IpAddr, Behavior>,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    power: Mutex<HashMap<IpAddr, PowerState>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeGateway {
    pub fn new(default: Behavior) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            delay: Duration::ZERO,
            gate: None,
            power: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, address: [u8; 4], behavior: Behavior) -> Self {
        self.overrides.insert(IpAddr::from(address), behavior);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every remote call waits for a permit on `gate` first.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn power_of(&self, address: IpAddr) -> PowerState {
        self.power
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or(PowerState::On)
    }

    fn behavior(&self, endpoint: &Endpoint) -> Behavior {
        self.overrides
            .get(&endpoint.address)
            .copied()
            .unwrap_or(self.default)
    }

    async fn enter(&self, endpoint: &Endpoint) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.ok();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let verdict = match self.behavior(endpoint) {
            Behavior::Healthy => Ok(()),
            Behavior::Closed | Behavior::Failing => {
                Err(RemoteError::Unavailable(endpoint.to_string()))
            }
            Behavior::Locked => Err(RemoteError::AuthFailed(endpoint.to_string())),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("gateway blew up on {endpoint}"),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        verdict
    }
}

#[async_trait]
impl CommandGateway for FakeGateway {
    async fn probe_identity(
        &self,
        endpoint: &Endpoint,
        _credential: &Credential,
        _timeout: Duration,
    ) -> Result<DeviceIdentity, RemoteError> {
        self.enter(endpoint).await?;
        Ok(DeviceIdentity {
            manufacturer: "Supermicro".into(),
            model: "X12".into(),
            serial: format!("SN-{}", endpoint.address),
            firmware_version: "1.4".into(),
        })
    }

    async fn get_power_state(
        &self,
        endpoint: &Endpoint,
        _credential: &Credential,
        _timeout: Duration,
    ) -> Result<PowerState, RemoteError> {
        self.enter(endpoint).await?;
        Ok(self.power_of(endpoint.address))
    }

    async fn get_sensor_readings(
        &self,
        endpoint: &Endpoint,
        _credential: &Credential,
        _timeout: Duration,
    ) -> Result<SensorReadings, RemoteError> {
        self.enter(endpoint).await?;
        Ok(SensorReadings {
            temperature: vec![38.5, 41.0],
            voltage: vec![12.1],
            fan_speed: vec![5400.0, 5380.0],
        })
    }

    async fn set_power_state(
        &self,
        endpoint: &Endpoint,
        _credential: &Credential,
        action: PowerAction,
        _timeout: Duration,
    ) -> Result<(), RemoteError> {
        self.enter(endpoint).await?;
        self.power
            .lock()
            .unwrap()
            .insert(endpoint.address, action.expected_state());
        Ok(())
    }
}

#[async_trait]
impl Reachability for FakeGateway {
    async fn is_reachable(&self, endpoint: &Endpoint, _timeout: Duration) -> bool {
        self.behavior(endpoint) != Behavior::Closed
    }
}

/// Inventory whose listing or updates can be made to fail or stall.
pub struct FlakyInventory {
    pub members: Vec<FleetMember>,
    pub fail_listing: bool,
    pub fail_lookup: bool,
    pub stall_lookup: bool,
    pub stall_updates: bool,
}

impl FlakyInventory {
    pub fn new(members: Vec<FleetMember>) -> Self {
        Self {
            members,
            fail_listing: false,
            fail_lookup: false,
            stall_lookup: false,
            stall_updates: false,
        }
    }
}

#[async_trait]
impl InventoryStore for FlakyInventory {
    async fn list_fleet_members(&self) -> Result<Vec<FleetMember>, InventoryError> {
        if self.fail_listing {
            return Err(InventoryError::Backend("database is down".into()));
        }
        Ok(self.members.clone())
    }

    async fn find_by_address(&self, address: IpAddr) -> Result<Option<FleetMember>, InventoryError> {
        if self.stall_lookup {
            std::future::pending::<()>().await;
        }
        if self.fail_lookup {
            return Err(InventoryError::Backend("index unavailable".into()));
        }
        Ok(self.members.iter().find(|m| m.address == address).cloned())
    }

    async fn get_member(&self, id: MemberId) -> Result<Option<FleetMember>, InventoryError> {
        Ok(self.members.iter().find(|m| m.id == id).cloned())
    }

    async fn update_member_state(
        &self,
        _id: MemberId,
        _update: MemberStateUpdate,
    ) -> Result<(), InventoryError> {
        if self.stall_updates {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

pub fn member(n: u8) -> FleetMember {
    FleetMember {
        id: MemberId(n as u64),
        address: IpAddr::from([10, 0, 2, n]),
        port: 443,
        credential: Credential::new("root", "calvin", 0),
    }
}

pub fn fleet(count: u8) -> Vec<FleetMember> {
    (1..=count).map(member).collect()
}
