//! # Command Gateway Port
//!
//! The opaque client that speaks a controller's remote-management protocol.
//!
//! ## Contract
//! * Every call returns within its `timeout` or fails with [`RemoteError::Timeout`].
//! * Calls never retry internally. Retry policy belongs to the caller.
//! * Calls are stateless: each one carries the endpoint and credential it needs, so
//!   concurrently running tasks never share a session.

use std::time::Duration;

use async_trait::async_trait;

use crate::credential::Credential;
use crate::device::DeviceIdentity;
use crate::error::RemoteError;
use crate::network::endpoint::Endpoint;
use crate::power::{PowerAction, PowerState};
use crate::telemetry::SensorReadings;

#[async_trait]
pub trait CommandGateway: Send + Sync {
    async fn probe_identity(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<DeviceIdentity, RemoteError>;

    async fn get_power_state(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<PowerState, RemoteError>;

    async fn get_sensor_readings(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<SensorReadings, RemoteError>;

    async fn set_power_state(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        action: PowerAction,
        timeout: Duration,
    ) -> Result<(), RemoteError>;
}
