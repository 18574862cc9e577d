//! State store: update, reconciliation and removal of platforms.
//!
//! Every public operation starts by reloading the state file, so edits made
//! by hand between two runs are picked up. Every single assignment is
//! written back and announced to the notifier before the next one is made,
//! which means an interrupted run keeps everything it assigned so far.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use std::fmt;
use std::net::Ipv4Addr;

use super::persist::StateFile;
use super::types::{GlobalState, PlatformState, PortKind};
use crate::ip::{next_ip, next_port, next_subnet};
use crate::manifest::Notifier;
use crate::platform::{PlatformError, PlatformSource};

/// A single resource handed out during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Subnet {
        platform: String,
        subnet: Ipv4Addr,
    },
    Ip {
        platform: String,
        host: String,
        ip: Ipv4Addr,
    },
    Port {
        platform: String,
        host: String,
        kind: PortKind,
        port: u16,
    },
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignment::Subnet { platform, subnet } => {
                write!(f, "subnet {} -> platform '{}'", subnet, platform)
            }
            Assignment::Ip { host, ip, .. } => write!(f, "ip {} -> host '{}'", ip, host),
            Assignment::Port { host, kind, port, .. } => {
                write!(f, "{} {} -> host '{}'", kind, port, host)
            }
        }
    }
}

/// A requested platform that could not be loaded
#[derive(Debug)]
pub struct SkippedPlatform {
    pub name: String,
    pub error: PlatformError,
}

/// Outcome of [`StateStore::update`]
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub skipped: Vec<SkippedPlatform>,
    pub assignments: Vec<Assignment>,
}

impl UpdateReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Drives the load / mutate / persist cycle over the state file
pub struct StateStore<S, N> {
    file: StateFile,
    source: S,
    notifier: N,
}

impl<S: PlatformSource, N: Notifier> StateStore<S, N> {
    pub fn new(file: StateFile, source: S, notifier: N) -> Self {
        Self {
            file,
            source,
            notifier,
        }
    }

    pub fn state_file(&self) -> &StateFile {
        &self.file
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Current persisted state
    pub fn load(&self) -> Result<GlobalState> {
        self.file.load()
    }

    /// Merge the named platforms into the state and reconcile everything
    ///
    /// Platforms whose definition cannot be loaded are skipped and listed in
    /// the report; the others are still processed.
    pub fn update<I, T>(&mut self, platform_names: I) -> Result<UpdateReport>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let persisted = self.file.load()?;
        let mut report = UpdateReport::default();

        let mut incoming = GlobalState::default();
        for name in platform_names {
            let name = name.as_ref();
            match self.source.load(name) {
                Ok(hosts) => {
                    incoming
                        .platforms
                        .insert(name.to_string(), PlatformState::with_hosts(hosts));
                }
                Err(error) => {
                    warn!("Could not load platform '{}': {}. Skipping it.", name, error);
                    report.skipped.push(SkippedPlatform {
                        name: name.to_string(),
                        error,
                    });
                }
            }
        }

        let mut state = persisted
            .merged_with(&incoming)
            .wrap_err("Failed to merge platform definitions into the state")?;
        self.commit(&state)?;

        report.assignments = self.reconcile_state(&mut state)?;
        Ok(report)
    }

    /// Reload the state and fill in every missing assignment
    pub fn reconcile(&mut self) -> Result<Vec<Assignment>> {
        let mut state = self.file.load()?;
        self.reconcile_state(&mut state)
    }

    /// Remove a platform, returning whether it was present
    pub fn remove_platform(&mut self, name: &str) -> Result<bool> {
        let mut state = self.file.load()?;
        if state.platforms.remove(name).is_none() {
            info!("Platform '{}' is not in the state, nothing to remove", name);
            return Ok(false);
        }

        info!("Removed platform '{}'", name);
        self.commit(&state)?;
        Ok(true)
    }

    /// Walk all platforms: subnet first, then host IPs, then server ports
    pub fn reconcile_state(&mut self, state: &mut GlobalState) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();

        for platform in state.platform_names() {
            assignments.extend(self.assign_subnet(state, &platform)?);

            let hosts: Vec<String> = state
                .platform(&platform)
                .map(|entry| entry.hosts.keys().cloned().collect())
                .unwrap_or_default();
            for host in &hosts {
                assignments.extend(self.assign_ip(state, &platform, host)?);
            }
            for host in &hosts {
                for kind in PortKind::ALL {
                    assignments.extend(self.assign_port(state, &platform, host, kind)?);
                }
            }
        }

        Ok(assignments)
    }

    fn assign_subnet(
        &mut self,
        state: &mut GlobalState,
        platform: &str,
    ) -> Result<Option<Assignment>> {
        let used = state.used_subnets();
        let Some(entry) = state.platforms.get_mut(platform) else {
            return Ok(None);
        };
        if entry.subnet.is_some() {
            return Ok(None);
        }

        let subnet = next_subnet(&used)
            .wrap_err_with(|| format!("Cannot assign a subnet to platform '{}'", platform))?;
        entry.subnet = Some(subnet);
        info!("Assigned subnet {} to platform '{}'", subnet, platform);
        self.commit(state)?;

        Ok(Some(Assignment::Subnet {
            platform: platform.to_string(),
            subnet,
        }))
    }

    fn assign_ip(
        &mut self,
        state: &mut GlobalState,
        platform: &str,
        host: &str,
    ) -> Result<Option<Assignment>> {
        let Some(entry) = state.platforms.get_mut(platform) else {
            return Ok(None);
        };
        let subnet = entry
            .subnet
            .ok_or_else(|| eyre!("Platform '{}' has no subnet", platform))?;
        let used = entry.used_ips();
        let Some(target) = entry.hosts.get_mut(host) else {
            return Ok(None);
        };
        if target.ip.is_some() {
            return Ok(None);
        }

        let ip = next_ip(subnet, &used)
            .wrap_err_with(|| format!("Cannot assign an IP to host '{}'", host))?;
        target.ip = Some(ip);
        info!("Assigned ip {} to host '{}'", ip, host);
        self.commit(state)?;

        Ok(Some(Assignment::Ip {
            platform: platform.to_string(),
            host: host.to_string(),
            ip,
        }))
    }

    fn assign_port(
        &mut self,
        state: &mut GlobalState,
        platform: &str,
        host: &str,
        kind: PortKind,
    ) -> Result<Option<Assignment>> {
        let used = state.used_ports();
        let Some(target) = state.host_mut(platform, host) else {
            return Ok(None);
        };
        if !target.is_server() || target.port(kind).is_some() {
            return Ok(None);
        }

        let port = next_port(&used)
            .wrap_err_with(|| format!("Cannot assign {} to host '{}'", kind, host))?;
        *target.port_mut(kind) = Some(port);
        info!("Assigned {} {} to host '{}'", kind, port, host);
        self.commit(state)?;

        Ok(Some(Assignment::Port {
            platform: platform.to_string(),
            host: host.to_string(),
            kind,
            port,
        }))
    }

    /// Persist the state, then announce the platform list
    fn commit(&mut self, state: &GlobalState) -> Result<()> {
        self.file.write(state)?;
        self.notifier.notify(&state.platform_names())
    }
}
