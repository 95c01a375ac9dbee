//! # bmcfleet-common
//!
//! Domain models and outbound ports shared by the discovery and refresh engines.
//!
//! * **Models**: [`network::target`], [`credential`], [`device`], [`fleet`],
//!   [`power`], [`telemetry`], [`refresh`].
//! * **Ports**: [`gateway::CommandGateway`], [`inventory::InventoryStore`] and
//!   [`network::reachability::Reachability`]. Implemented outside this crate.
//!
//! Nothing in here performs I/O.

pub mod config;
pub mod credential;
pub mod device;
pub mod error;
pub mod fleet;
pub mod gateway;
pub mod inventory;
pub mod network;
pub mod power;
pub mod refresh;
pub mod telemetry;
