//! Address parsing, endpoints and the transport-level reachability port.

pub mod endpoint;
pub mod range;
pub mod reachability;
pub mod target;
