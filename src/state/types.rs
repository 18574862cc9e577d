//! Persisted allocation state.
//!
//! The state file is a JSON object keyed by platform name. Known fields are
//! typed; anything else found in a platform or host entry is kept in
//! `attributes` and written back verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;

/// Role tag of hosts that get forwarded HTTP/HTTPS ports
pub const SERVER_ROLE: &str = "server";

/// Which forwarded port of a server host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Http,
    Https,
}

impl PortKind {
    pub const ALL: [PortKind; 2] = [PortKind::Http, PortKind::Https];

    /// Attribute name of this port in the state file
    pub fn key(self) -> &'static str {
        match self {
            PortKind::Http => "http-port",
            PortKind::Https => "https-port",
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One virtual host of a platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    /// Role tag (`server`, `relay`, `agent`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rudder_setup: Option<String>,
    /// OS tag, e.g. `debian12` or `windows2019`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Memory in MiB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,
    /// Everything else from the platform definition (cpus, ...)
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl HostState {
    pub fn is_server(&self) -> bool {
        self.rudder_setup.as_deref() == Some(SERVER_ROLE)
    }

    pub fn port(&self, kind: PortKind) -> Option<u16> {
        match kind {
            PortKind::Http => self.http_port,
            PortKind::Https => self.https_port,
        }
    }

    pub fn port_mut(&mut self, kind: PortKind) -> &mut Option<u16> {
        match kind {
            PortKind::Http => &mut self.http_port,
            PortKind::Https => &mut self.https_port,
        }
    }

    /// All forwarded ports currently set on this host
    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        PortKind::ALL.into_iter().filter_map(|kind| self.port(kind))
    }
}

/// A named group of hosts sharing one /24 subnet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Ipv4Addr>,
    pub hosts: BTreeMap<String, HostState>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl PlatformState {
    /// Fresh platform entry from loaded host definitions
    pub fn with_hosts(hosts: BTreeMap<String, HostState>) -> Self {
        Self {
            hosts,
            ..Self::default()
        }
    }

    /// IPs already assigned to hosts of this platform
    pub fn used_ips(&self) -> HashSet<Ipv4Addr> {
        self.hosts.values().filter_map(|host| host.ip).collect()
    }
}

/// The whole persisted state: platform name -> platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalState {
    pub platforms: BTreeMap<String, PlatformState>,
}

impl GlobalState {
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Platform names in sorted order
    pub fn platform_names(&self) -> Vec<String> {
        self.platforms.keys().cloned().collect()
    }

    pub fn platform(&self, name: &str) -> Option<&PlatformState> {
        self.platforms.get(name)
    }

    pub fn host(&self, platform: &str, host: &str) -> Option<&HostState> {
        self.platforms.get(platform)?.hosts.get(host)
    }

    pub fn host_mut(&mut self, platform: &str, host: &str) -> Option<&mut HostState> {
        self.platforms.get_mut(platform)?.hosts.get_mut(host)
    }

    /// Subnets assigned to any platform
    pub fn used_subnets(&self) -> HashSet<Ipv4Addr> {
        self.platforms.values().filter_map(|platform| platform.subnet).collect()
    }

    /// HTTP and HTTPS ports assigned anywhere in the state
    pub fn used_ports(&self) -> HashSet<u16> {
        self.platforms
            .values()
            .flat_map(|platform| platform.hosts.values())
            .flat_map(HostState::ports)
            .collect()
    }
}
