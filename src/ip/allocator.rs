//! Subnet and host address allocation.
//!
//! This file contains the "next available" scans for platform subnets and
//! host IPs. Both are pure: the caller collects what is already in use from
//! the persisted state and gets back the first free value of a fixed,
//! deterministic sequence.

use std::collections::HashSet;
use std::net::Ipv4Addr;

/// First two octets of every platform subnet
const SUBNET_PREFIX: [u8; 2] = [192, 168];

/// Host octet reserved for the platform gateway, never handed to a host
const GATEWAY_OCTET: u8 = 1;

/// Errors returned when a sequence has no free value left
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("All subnets from 192.168.0.0 to 192.168.255.0 are in use")]
    SubnetsExhausted,

    #[error("No free host address left in subnet {subnet}/24")]
    SubnetFull { subnet: Ipv4Addr },

    #[error("Subnet {subnet} is not a /24 network address")]
    InvalidSubnet { subnet: Ipv4Addr },

    #[error("All ports from {first} to 65535 are in use")]
    PortsExhausted { first: u16 },
}

/// Get the first subnet of `192.168.0.0, 192.168.1.0, ...` not in `used`
///
/// # Examples
/// ```
/// use rtf::ip::next_subnet;
/// use std::collections::HashSet;
/// use std::net::Ipv4Addr;
///
/// let used = HashSet::from([Ipv4Addr::new(192, 168, 0, 0)]);
/// assert_eq!(next_subnet(&used), Ok(Ipv4Addr::new(192, 168, 1, 0)));
/// ```
pub fn next_subnet(used: &HashSet<Ipv4Addr>) -> Result<Ipv4Addr, AllocationError> {
    let [a, b] = SUBNET_PREFIX;
    (0..=u8::MAX)
        .map(|index| Ipv4Addr::new(a, b, index, 0))
        .find(|subnet| !used.contains(subnet))
        .ok_or(AllocationError::SubnetsExhausted)
}

/// Get the first host address of a /24 subnet not in `used`
///
/// Candidates are `.1` to `.254` in ascending order. The gateway address
/// `.1` is always skipped, assigned or not.
pub fn next_ip(subnet: Ipv4Addr, used: &HashSet<Ipv4Addr>) -> Result<Ipv4Addr, AllocationError> {
    let [a, b, c, d] = subnet.octets();
    if d != 0 {
        return Err(AllocationError::InvalidSubnet { subnet });
    }

    (1..u8::MAX)
        .filter(|&host| host != GATEWAY_OCTET)
        .map(|host| Ipv4Addr::new(a, b, c, host))
        .find(|ip| !used.contains(ip))
        .ok_or(AllocationError::SubnetFull { subnet })
}

/// Address reserved for the gateway of a /24 subnet
pub fn gateway_of(subnet: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = subnet.octets();
    Ipv4Addr::new(a, b, c, GATEWAY_OCTET)
}

/// Check whether `ip` is a usable host address of the /24 `subnet`
pub fn is_in_subnet(ip: Ipv4Addr, subnet: Ipv4Addr) -> bool {
    let ip = ip.octets();
    let net = subnet.octets();
    ip[..3] == net[..3] && ip[3] != 0 && ip[3] != u8::MAX
}
