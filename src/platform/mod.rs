//! Platform definition loading.
//!
//! A platform is declared in `<platforms_dir>/<name>.json`: a `default`
//! object applied to every host plus one object per host short-name that
//! overrides those defaults. Loading turns it into the host entries the
//! state store merges into persisted state.

pub mod loader;

use std::collections::BTreeMap;

use crate::state::HostState;

pub use loader::{build_hosts, default_ram, PlatformLoader};

/// Errors that can occur while loading one platform definition
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Invalid platform name '{name}' (only letters, digits and '_' are allowed)")]
    InvalidName { name: String },

    #[error("Platform definition not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON syntax error in {path}: {source}")]
    Syntax {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No 'default' key in platform file {path}")]
    MissingDefault { path: String },

    #[error("Entry '{key}' in {path} must be a JSON object")]
    NotAnObject { path: String, key: String },

    #[error("Invalid attributes for host '{host}' in {path}: {source}")]
    InvalidHost {
        path: String,
        host: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that can produce the host entries of a platform by name
pub trait PlatformSource {
    /// Load the hosts of `name`, keyed by host long-name
    fn load(&self, name: &str) -> Result<BTreeMap<String, HostState>, PlatformError>;
}

/// Check that a platform name is usable as a file name and manifest entry
pub fn is_valid_platform_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
