//! # IPv4 Range Model
//!
//! Continuous, inclusive ranges of IPv4 addresses and the CIDR expansion used by
//! [`crate::network::target::AddressSpec`].

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::InvalidRangeError;

/// Represents a continuous range of IPv4 addresses, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Builds a range, rejecting `start > end` by numeric comparison.
    pub fn ordered(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Result<Self, InvalidRangeError> {
        if u32::from(start_addr) > u32::from(end_addr) {
            return Err(InvalidRangeError::Reversed {
                start: start_addr,
                end: end_addr,
            });
        }
        Ok(Self::new(start_addr, end_addr))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn len(&self) -> u64 {
        let start: u64 = u32::from(self.start_addr).into();
        let end: u64 = u32::from(self.end_addr).into();
        if start > end { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates the range of usable hosts inside a CIDR block (e.g. `192.168.1.0/24`).
///
/// Host bits set in `ip` are ignored. The network and broadcast addresses are
/// stripped; blocks too small to strip (`/31`, `/32`) are returned whole.
pub fn cidr_hosts(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, InvalidRangeError> {
    let network = Ipv4Network::new(ip, prefix)
        .map_err(|_| InvalidRangeError::Prefix(prefix.to_string()))?;

    let net_u32: u32 = u32::from(network.network());
    let broadcast_u32: u32 = u32::from(network.broadcast());

    let start_u32 = net_u32.saturating_add(1);
    let end_u32 = broadcast_u32.saturating_sub(1);

    if start_u32 <= end_u32 {
        Ok(Ipv4Range::new(Ipv4Addr::from(start_u32), Ipv4Addr::from(end_u32)))
    } else {
        Ok(Ipv4Range::new(network.network(), network.broadcast()))
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
