//! State consistency checks.
//!
//! The reconciliation pass never produces colliding assignments, but the
//! state file is plain JSON and can be edited by hand. These checks report
//! everything that breaks the allocation invariants.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::ip::{gateway_of, is_in_subnet};
use crate::state::{GlobalState, PortKind};

/// One broken invariant found in the state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateViolation {
    #[error("Subnet {subnet} is used by platforms '{first}' and '{second}'")]
    DuplicateSubnet {
        subnet: Ipv4Addr,
        first: String,
        second: String,
    },

    #[error("IP {ip} is used by hosts '{first}' and '{second}' in platform '{platform}'")]
    DuplicateIp {
        platform: String,
        ip: Ipv4Addr,
        first: String,
        second: String,
    },

    #[error("IP {ip} of host '{host}' is outside subnet {subnet}/24")]
    IpOutsideSubnet {
        host: String,
        ip: Ipv4Addr,
        subnet: Ipv4Addr,
    },

    #[error("Host '{host}' uses the reserved gateway address {ip}")]
    GatewayIp { host: String, ip: Ipv4Addr },

    #[error("Port {port} is used by hosts '{first}' and '{second}'")]
    DuplicatePort {
        port: u16,
        first: String,
        second: String,
    },

    #[error("Host '{host}' has {kind} but is not a server")]
    PortOnNonServer { host: String, kind: PortKind },
}

/// Check the allocation invariants of a state
///
/// Returns every violation found, in platform then host order.
pub fn validate_state(state: &GlobalState) -> Result<(), Vec<StateViolation>> {
    let mut violations = Vec::new();
    let mut subnets: HashMap<Ipv4Addr, &str> = HashMap::new();
    let mut ports: HashMap<u16, &str> = HashMap::new();

    for (platform_name, platform) in &state.platforms {
        if let Some(subnet) = platform.subnet {
            if let Some(first) = subnets.insert(subnet, platform_name) {
                violations.push(StateViolation::DuplicateSubnet {
                    subnet,
                    first: first.to_string(),
                    second: platform_name.clone(),
                });
            }
        }

        let mut ips: HashMap<Ipv4Addr, &str> = HashMap::new();
        for (host_name, host) in &platform.hosts {
            if let Some(ip) = host.ip {
                if let Some(first) = ips.insert(ip, host_name) {
                    violations.push(StateViolation::DuplicateIp {
                        platform: platform_name.clone(),
                        ip,
                        first: first.to_string(),
                        second: host_name.clone(),
                    });
                }
                if let Some(subnet) = platform.subnet {
                    if !is_in_subnet(ip, subnet) {
                        violations.push(StateViolation::IpOutsideSubnet {
                            host: host_name.clone(),
                            ip,
                            subnet,
                        });
                    } else if ip == gateway_of(subnet) {
                        violations.push(StateViolation::GatewayIp {
                            host: host_name.clone(),
                            ip,
                        });
                    }
                }
            }

            for kind in PortKind::ALL {
                let Some(port) = host.port(kind) else {
                    continue;
                };
                if !host.is_server() {
                    violations.push(StateViolation::PortOnNonServer {
                        host: host_name.clone(),
                        kind,
                    });
                }
                if let Some(first) = ports.insert(port, host_name) {
                    violations.push(StateViolation::DuplicatePort {
                        port,
                        first: first.to_string(),
                        second: host_name.clone(),
                    });
                }
            }
        }
    }

    if violations.is_empty() {
        log::debug!("State check passed for {} platform(s)", state.platforms.len());
        Ok(())
    } else {
        Err(violations)
    }
}
