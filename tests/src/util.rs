use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bmcfleet_common::credential::{Credential, CredentialList};
use bmcfleet_common::device::DeviceIdentity;
use bmcfleet_common::error::RemoteError;
use bmcfleet_common::fleet::{FleetMember, MemberId};
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::network::endpoint::Endpoint;
use bmcfleet_common::network::reachability::Reachability;
use bmcfleet_common::power::{PowerAction, PowerState};
use bmcfleet_common::telemetry::SensorReadings;
use tokio::sync::Semaphore;

/// One simulated controller.
#[derive(Debug, Clone)]
pub struct SimController {
    /// Username this controller accepts. `None` rejects everything.
    pub accepts: Option<&'static str>,
    pub delay: Duration,
    pub hang: bool,
    pub power: PowerState,
}

impl SimController {
    pub fn open(user: &'static str) -> Self {
        Self {
            accepts: Some(user),
            delay: Duration::from_millis(20),
            hang: false,
            power: PowerState::On,
        }
    }

    pub fn locked() -> Self {
        Self {
            accepts: None,
            ..Self::open("")
        }
    }

    pub fn hung() -> Self {
        Self {
            hang: true,
            ..Self::open("root")
        }
    }

    pub fn slow(user: &'static str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::open(user)
        }
    }
}

/// A fleet of simulated controllers behind one gateway, with call accounting.
#[derive(Default)]
pub struct SimulatedFleet {
    controllers: HashMap<IpAddr, SimController>,
    power: Mutex<HashMap<IpAddr, PowerState>>,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SimulatedFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: Ipv4Addr, controller: SimController) -> Self {
        self.power
            .get_mut()
            .unwrap()
            .insert(address.into(), controller.power);
        self.controllers.insert(address.into(), controller);
        self
    }

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

    pub fn power_of(&self, address: Ipv4Addr) -> PowerState {
        self.power.lock().unwrap()[&IpAddr::from(address)]
    }

    async fn session(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<&SimController, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(self.in_flight.clone());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.ok();
        }

        let controller = self
            .controllers
            .get(&endpoint.address)
            .ok_or_else(|| RemoteError::Unavailable(endpoint.to_string()))?;
        if controller.hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(controller.delay).await;

        match controller.accepts {
            Some(user) if user == credential.username => Ok(controller),
            _ => Err(RemoteError::AuthFailed(credential.username.clone())),
        }
    }
}

#[async_trait]
impl CommandGateway for SimulatedFleet {
    async fn probe_identity(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        _timeout: Duration,
    ) -> Result<DeviceIdentity, RemoteError> {
        self.session(endpoint, credential).await?;
        Ok(DeviceIdentity {
            manufacturer: "HPE".into(),
            model: "iLO 5".into(),
            serial: format!("CZ{}", endpoint.address),
            firmware_version: "2.81".into(),
        })
    }

    async fn get_power_state(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        _timeout: Duration,
    ) -> Result<PowerState, RemoteError> {
        self.session(endpoint, credential).await?;
        Ok(self.power.lock().unwrap()[&endpoint.address])
    }

    async fn get_sensor_readings(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        _timeout: Duration,
    ) -> Result<SensorReadings, RemoteError> {
        self.session(endpoint, credential).await?;
        Ok(SensorReadings {
            temperature: vec![35.0, 52.5],
            voltage: vec![11.9, 12.2],
            fan_speed: vec![6100.0],
        })
    }

    async fn set_power_state(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        action: PowerAction,
        _timeout: Duration,
    ) -> Result<(), RemoteError> {
        self.session(endpoint, credential).await?;
        self.power
            .lock()
            .unwrap()
            .insert(endpoint.address, action.expected_state());
        Ok(())
    }
}

#[async_trait]
impl Reachability for SimulatedFleet {
    async fn is_reachable(&self, endpoint: &Endpoint, _timeout: Duration) -> bool {
        self.controllers.contains_key(&endpoint.address)
    }
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

pub fn credentials() -> CredentialList {
    CredentialList::new(vec![
        Credential::new("Administrator", "password", 2),
        Credential::new("root", "calvin", 0),
        Credential::new("ADMIN", "ADMIN", 1),
    ])
}

/// Members `#1..=#count` at `10.20.0.1..` logging in as root.
pub fn members(count: u8) -> Vec<FleetMember> {
    (1..=count)
        .map(|n| FleetMember {
            id: MemberId(n as u64),
            address: IpAddr::V4(ip(10, 20, 0, n)),
            port: 443,
            credential: Credential::new("root", "calvin", 0),
        })
        .collect()
}

/// A simulated controller for every member in [`members`].
pub fn fleet_for(count: u8) -> SimulatedFleet {
    (1..=count).fold(SimulatedFleet::new(), |fleet, n| {
        fleet.with(ip(10, 20, 0, n), SimController::open("root"))
    })
}
