//! Forwarded port allocation for server hosts.

use std::collections::HashSet;

use super::allocator::AllocationError;

/// First port handed out to a server host
pub const FIRST_PORT: u16 = 8080;

/// Get the first port from 8080 upward that is not in `used`
///
/// `used` holds every `http-port` and `https-port` of the whole state,
/// so ports are unique across platforms.
pub fn next_port(used: &HashSet<u16>) -> Result<u16, AllocationError> {
    (FIRST_PORT..=u16::MAX)
        .find(|port| !used.contains(port))
        .ok_or(AllocationError::PortsExhausted { first: FIRST_PORT })
}
