//! # Scan Target Model
//!
//! Defines the address specifications a discovery run accepts and the
//! [`ScanTarget`]s they expand to.
//!
//! Supported forms, checked in this order:
//! * A comma separated list of single addresses (`192.168.1.5, 192.168.1.9`).
//! * A CIDR block (`192.168.1.0/24`), expanded to its usable hosts.
//! * A full range (`192.168.1.1-192.168.1.50`).
//! * A single IPv4 address.
//!
//! Parsing is pure and deterministic: the same expression always yields the same
//! addresses in the same order.

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::InvalidRangeError;
use crate::network::range::{self, Ipv4Range};

/// Upper bound on the number of addresses one specification may expand to.
pub const MAX_TARGETS: u64 = 65_536;

/// A parsed address specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressSpec {
    /// Explicit addresses, in input order, without duplicates.
    List { addrs: Vec<Ipv4Addr> },
    /// Usable hosts of a CIDR block.
    Cidr { hosts: Ipv4Range },
    /// An inclusive `start-end` range.
    Range { ipv4_range: Ipv4Range },
    /// A single host.
    Host { target_addr: Ipv4Addr },
}

/// One candidate address to probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub address: Ipv4Addr,
    pub port: u16,
    /// Position of the address in the parsed specification.
    pub ordinal: usize,
}

impl FromStr for AddressSpec {
    type Err = InvalidRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidRangeError::Empty);
        }

        let spec = if s.contains(',') {
            parse_commas(s)?
        } else if let Some(spec) = parse_cidr(s)? {
            spec
        } else if let Some(spec) = parse_ip_range(s)? {
            spec
        } else {
            AddressSpec::Host {
                target_addr: parse_addr(s)?,
            }
        };

        let count = spec.len();
        if count > MAX_TARGETS {
            return Err(InvalidRangeError::TooManyTargets {
                spec: s.to_string(),
                count,
                limit: MAX_TARGETS,
            });
        }
        Ok(spec)
    }
}

impl AddressSpec {
    pub fn len(&self) -> u64 {
        match self {
            AddressSpec::List { addrs } => addrs.len() as u64,
            AddressSpec::Cidr { hosts } => hosts.len(),
            AddressSpec::Range { ipv4_range } => ipv4_range.len(),
            AddressSpec::Host { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands the specification into its addresses, ascending for blocks and
    /// ranges, input order for lists.
    pub fn addresses(&self) -> Vec<Ipv4Addr> {
        match self {
            AddressSpec::List { addrs } => addrs.clone(),
            AddressSpec::Cidr { hosts } => hosts.iter().collect(),
            AddressSpec::Range { ipv4_range } => ipv4_range.iter().collect(),
            AddressSpec::Host { target_addr } => vec![*target_addr],
        }
    }

    /// Expands the specification into probe targets on `port`.
    pub fn to_targets(&self, port: u16) -> Vec<ScanTarget> {
        self.addresses()
            .into_iter()
            .enumerate()
            .map(|(ordinal, address)| ScanTarget {
                address,
                port,
                ordinal,
            })
            .collect()
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpec::List { addrs } => {
                let joined: Vec<String> = addrs.iter().map(Ipv4Addr::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
            AddressSpec::Cidr { hosts } | AddressSpec::Range { ipv4_range: hosts } => {
                write!(f, "{}-{}", hosts.start_addr, hosts.end_addr)
            }
            AddressSpec::Host { target_addr } => write!(f, "{target_addr}"),
        }
    }
}

/// Parses `spec` into its ordered addresses.
pub fn parse(spec: &str) -> Result<Vec<Ipv4Addr>, InvalidRangeError> {
    Ok(spec.parse::<AddressSpec>()?.addresses())
}

/// Parses a comma-separated list. Every entry must be a single address; one bad
/// entry rejects the whole list.
fn parse_commas(s: &str) -> Result<AddressSpec, InvalidRangeError> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    let mut addrs: Vec<Ipv4Addr> = Vec::new();

    for part in s.split(',') {
        let addr = parse_addr(part.trim())?;
        if seen.insert(addr) {
            addrs.push(addr);
        }
    }

    Ok(AddressSpec::List { addrs })
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr(s: &str) -> Result<Option<AddressSpec>, InvalidRangeError> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = parse_addr(ip_str.trim())?;
    let prefix = prefix_str
        .trim()
        .parse::<u8>()
        .map_err(|_| InvalidRangeError::Prefix(prefix_str.to_string()))?;

    let hosts = range::cidr_hosts(ipv4_addr, prefix)?;
    Ok(Some(AddressSpec::Cidr { hosts }))
}

/// Parses a range string like "10.0.0.1-10.0.0.20".
fn parse_ip_range(s: &str) -> Result<Option<AddressSpec>, InvalidRangeError> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = parse_addr(start_str.trim())?;
    let end_addr = parse_addr(end_str.trim())?;

    let ipv4_range = Ipv4Range::ordered(start_addr, end_addr)?;
    Ok(Some(AddressSpec::Range { ipv4_range }))
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, InvalidRangeError> {
    s.parse::<Ipv4Addr>()
        .map_err(|_| InvalidRangeError::Address(s.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
