//! # Error Taxonomy
//!
//! Only [`InvalidRangeError`] and a failed fleet snapshot ([`RefreshError`]) ever fail
//! a whole operation. Every remote failure is local to one target or member and is
//! folded into that slot of the aggregate report.

use std::net::Ipv4Addr;
use std::time::Duration;

use thiserror::Error;

use crate::fleet::MemberId;

/// A malformed or unsupported address specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRangeError {
    #[error("address specification is empty")]
    Empty,
    #[error("invalid IPv4 address '{0}'")]
    Address(String),
    #[error("invalid CIDR prefix '{0}'")]
    Prefix(String),
    #[error("range start {start} is greater than range end {end}")]
    Reversed { start: Ipv4Addr, end: Ipv4Addr },
    #[error("'{spec}' expands to {count} targets, the limit is {limit}")]
    TooManyTargets { spec: String, count: u64, limit: u64 },
}

/// Failure of a single Command Gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("controller unavailable: {0}")]
    Unavailable(String),
    #[error("authentication rejected: {0}")]
    AuthFailed(String),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("member {0} does not exist")]
    NotFound(MemberId),
    #[error("inventory backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
}

/// Engine-level failure of a refresh pass. Per-member failures never end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("could not take the fleet snapshot: {0}")]
    Snapshot(#[source] InventoryError),
}

/// Why a single member did not refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("state update rejected: {0}")]
    Inventory(#[from] InventoryError),
    #[error("pass deadline expired before the member finished")]
    PassTimeout,
    #[error("refresh task panicked")]
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowerActionError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("power action task did not finish")]
    Incomplete,
}
