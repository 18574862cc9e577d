//! File-backed platform loader.

use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::{is_valid_platform_name, PlatformError, PlatformSource};
use crate::state::HostState;
use crate::utils::strip_line_comments;

/// Default directory holding `<platform>.json` files
pub const DEFAULT_PLATFORMS_DIR: &str = "platforms";

/// Key of the section applied to every host
const DEFAULT_SECTION: &str = "default";

/// Default memory (MiB) for a host, first matching rule wins:
/// server 2048, relay 512, Windows 2048, Solaris 1024, anything else 256
pub fn default_ram(rudder_setup: Option<&str>, system: Option<&str>) -> u64 {
    match (rudder_setup, system) {
        (Some("server"), _) => 2048,
        (Some("relay"), _) => 512,
        (_, Some(system)) if system.contains("win") => 2048,
        (_, Some(system)) if system.contains("solaris") => 1024,
        _ => 256,
    }
}

/// Build the host entries of `platform` from a parsed definition document
///
/// `origin` is only used in error messages.
pub fn build_hosts(
    platform: &str,
    document: &Value,
    origin: &str,
) -> Result<BTreeMap<String, HostState>, PlatformError> {
    let not_an_object = |key: &str| PlatformError::NotAnObject {
        path: origin.to_string(),
        key: key.to_string(),
    };

    let Value::Object(sections) = document else {
        return Err(not_an_object("<root>"));
    };
    let defaults = match sections.get(DEFAULT_SECTION) {
        Some(Value::Object(defaults)) => defaults,
        Some(_) => return Err(not_an_object(DEFAULT_SECTION)),
        None => {
            return Err(PlatformError::MissingDefault {
                path: origin.to_string(),
            })
        }
    };

    let mut hosts = BTreeMap::new();
    for (short_name, overrides) in sections {
        if short_name == DEFAULT_SECTION {
            continue;
        }
        let Value::Object(overrides) = overrides else {
            return Err(not_an_object(short_name));
        };

        let mut definition = defaults.clone();
        definition.extend(overrides.clone());

        let long_name = format!("{}_{}", platform, short_name);
        let ram = default_ram(
            definition.get("rudder-setup").and_then(Value::as_str),
            definition.get("system").and_then(Value::as_str),
        );

        // Computed attributes first, explicit ones from the file override them
        let mut attributes = Map::new();
        attributes.insert("short-name".to_string(), Value::from(short_name.as_str()));
        attributes.insert("long-name".to_string(), Value::from(long_name.as_str()));
        attributes.insert("ram".to_string(), Value::from(ram));
        attributes.extend(definition);

        let host: HostState = serde_json::from_value(Value::Object(attributes)).map_err(|source| {
            PlatformError::InvalidHost {
                path: origin.to_string(),
                host: short_name.clone(),
                source,
            }
        })?;
        debug!("Loaded host {} ({:?})", long_name, host.rudder_setup);
        hosts.insert(long_name, host);
    }

    Ok(hosts)
}

/// Loads platform definitions from `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct PlatformLoader {
    dir: PathBuf,
}

impl PlatformLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the definition file of a platform
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl Default for PlatformLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORMS_DIR)
    }
}

impl PlatformSource for PlatformLoader {
    fn load(&self, name: &str) -> Result<BTreeMap<String, HostState>, PlatformError> {
        if !is_valid_platform_name(name) {
            return Err(PlatformError::InvalidName {
                name: name.to_string(),
            });
        }

        let path = self.definition_path(name);
        let origin = path.display().to_string();
        if !path.is_file() {
            return Err(PlatformError::NotFound { path: origin });
        }

        let content = fs::read_to_string(&path).map_err(|source| PlatformError::Io {
            path: origin.clone(),
            source,
        })?;
        let document: Value = serde_json::from_str(&strip_line_comments(&content))
            .map_err(|source| PlatformError::Syntax {
                path: origin.clone(),
                source,
            })?;

        let hosts = build_hosts(name, &document, &origin)?;
        info!("Loaded platform '{}' with {} host(s) from {}", name, hosts.len(), origin);
        Ok(hosts)
    }
}
