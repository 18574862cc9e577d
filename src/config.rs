//! Tool settings.
//!
//! Paths used by `rtf` can be set in an optional `rtf.yaml` next to the
//! platform definitions. Every field has a default, and command-line flags
//! override what the file says.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::manifest::vagrantfile::{DEFAULT_MANIFEST_PATH, DEFAULT_TEMPLATE_PATH};
use crate::platform::loader::DEFAULT_PLATFORMS_DIR;
use crate::state::DEFAULT_STATE_PATH;

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "rtf.yaml";

/// Paths of every file `rtf` reads or writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Persisted allocation state
    pub state_path: PathBuf,
    /// Directory of `<platform>.json` definitions
    pub platforms_dir: PathBuf,
    /// Template of the Vagrantfile
    pub template_path: PathBuf,
    /// Generated Vagrantfile
    pub manifest_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            platforms_dir: PathBuf::from(DEFAULT_PLATFORMS_DIR),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
        }
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Setting '{0}' cannot be empty")]
    EmptyPath(&'static str),
    #[error("State file and manifest must be different files ({0})")]
    SamePath(String),
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        let paths = [
            ("state_path", &self.state_path),
            ("platforms_dir", &self.platforms_dir),
            ("template_path", &self.template_path),
            ("manifest_path", &self.manifest_path),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::EmptyPath(name));
            }
        }

        if self.state_path == self.manifest_path {
            return Err(ValidationError::SamePath(self.state_path.display().to_string()));
        }

        Ok(())
    }
}

/// Load and validate settings from a YAML file
pub fn load_settings(path: &Path) -> Result<Settings> {
    info!("Loading settings from: {:?}", path);

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open settings file '{}'", path.display()))?;
    let settings: Settings = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Invalid settings file '{}'", path.display()))?;

    settings.validate()?;
    Ok(settings)
}

/// Settings from `explicit` if given, else from `rtf.yaml` if it exists, else defaults
pub fn resolve_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => load_settings(path),
        None if Path::new(DEFAULT_SETTINGS_PATH).is_file() => {
            load_settings(Path::new(DEFAULT_SETTINGS_PATH))
        }
        None => {
            debug!("No {} found, using default settings", DEFAULT_SETTINGS_PATH);
            Ok(Settings::default())
        }
    }
}
