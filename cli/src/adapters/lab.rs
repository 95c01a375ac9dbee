//! Simulated controllers loaded from a JSON fixture.
//!
//! Stands in for a vendor protocol client. Each controller answers on one
//! address and port, accepts one credential, and responds after its latency
//! plus a random jitter.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tracing::trace;

use bmcfleet_common::config::DEFAULT_BMC_PORT;
use bmcfleet_common::credential::Credential;
use bmcfleet_common::device::DeviceIdentity;
use bmcfleet_common::error::RemoteError;
use bmcfleet_common::gateway::CommandGateway;
use bmcfleet_common::network::endpoint::Endpoint;
use bmcfleet_common::network::reachability::Reachability;
use bmcfleet_common::power::{PowerAction, PowerState};
use bmcfleet_common::telemetry::SensorReadings;

#[derive(Debug, Clone, Deserialize)]
pub struct LabController {
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub identity: DeviceIdentity,
    #[serde(default)]
    pub power: PowerState,
    #[serde(default)]
    pub sensors: SensorReadings,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
    /// Never answers once the port is open.
    #[serde(default)]
    pub hang: bool,
}

fn default_port() -> u16 {
    DEFAULT_BMC_PORT
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabFixture {
    pub controllers: Vec<LabController>,
}

pub struct LabGateway {
    controllers: HashMap<(IpAddr, u16), LabController>,
    power: Mutex<HashMap<(IpAddr, u16), PowerState>>,
}

impl LabGateway {
    pub fn new(fixture: LabFixture) -> Self {
        let controllers: HashMap<(IpAddr, u16), LabController> = fixture
            .controllers
            .into_iter()
            .map(|controller| ((controller.address, controller.port), controller))
            .collect();
        let power = controllers
            .iter()
            .map(|(key, controller)| (*key, controller.power))
            .collect();
        Self {
            controllers,
            power: Mutex::new(power),
        }
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    fn controller(&self, endpoint: &Endpoint) -> Result<&LabController, RemoteError> {
        self.controllers
            .get(&(endpoint.address, endpoint.port))
            .ok_or_else(|| RemoteError::Unavailable(endpoint.to_string()))
    }

    /// Waits out the simulated round trip, bounded by `timeout`, and checks the
    /// credential.
    async fn session(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<&LabController, RemoteError> {
        let controller = self.controller(endpoint)?;
        let delay = round_trip(controller);

        let answer = async {
            if controller.hang {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(delay).await;
        };
        tokio::time::timeout(timeout, answer)
            .await
            .map_err(|_| RemoteError::Timeout(timeout))?;

        if controller.username != credential.username || controller.password != credential.password {
            return Err(RemoteError::AuthFailed(format!(
                "{} rejected user '{}'",
                endpoint, credential.username
            )));
        }
        trace!(%endpoint, delay_ms = delay.as_millis() as u64, "lab session opened");
        Ok(controller)
    }

    fn power_state(&self, endpoint: &Endpoint) -> PowerState {
        self.power
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(endpoint.address, endpoint.port))
            .copied()
            .unwrap_or_default()
    }
}

fn round_trip(controller: &LabController) -> Duration {
    let jitter = if controller.jitter_ms > 0 {
        rand::rng().random_range(0..=controller.jitter_ms)
    } else {
        0
    };
    Duration::from_millis(controller.latency_ms + jitter)
}

#[async_trait]
impl CommandGateway for LabGateway {
    async fn probe_identity(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<DeviceIdentity, RemoteError> {
        let controller = self.session(endpoint, credential, timeout).await?;
        Ok(controller.identity.clone())
    }

    async fn get_power_state(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<PowerState, RemoteError> {
        self.session(endpoint, credential, timeout).await?;
        Ok(self.power_state(endpoint))
    }

    async fn get_sensor_readings(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<SensorReadings, RemoteError> {
        let controller = self.session(endpoint, credential, timeout).await?;
        let mut readings = controller.sensors.clone();
        if self.power_state(endpoint) != PowerState::On {
            readings.fan_speed.iter_mut().for_each(|rpm| *rpm = 0.0);
        }
        Ok(readings)
    }

    async fn set_power_state(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        action: PowerAction,
        timeout: Duration,
    ) -> Result<(), RemoteError> {
        self.session(endpoint, credential, timeout).await?;
        self.power
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((endpoint.address, endpoint.port), action.expected_state());
        Ok(())
    }
}

#[async_trait]
impl Reachability for LabGateway {
    async fn is_reachable(&self, endpoint: &Endpoint, timeout: Duration) -> bool {
        let Ok(controller) = self.controller(endpoint) else {
            return false;
        };
        let delay = round_trip(controller).min(timeout);
        tokio::time::sleep(delay).await;
        delay < timeout
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
