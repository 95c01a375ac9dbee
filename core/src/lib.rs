//! Concurrency core of the fleet manager: controller discovery, periodic refresh
//! passes and power actions, all built on one bounded fan-out primitive.

pub mod batch;
pub mod control;
pub mod discovery;
pub mod inventory;
pub mod network;
pub mod probe;
pub mod refresh;

#[cfg(test)]
mod testing;
