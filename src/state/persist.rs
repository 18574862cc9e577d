//! State file persistence.
//!
//! The state is written as JSON with keys sorted at every level and 2-space
//! indentation, so writing unchanged state produces identical bytes and the
//! file diffs cleanly under version control.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::debug;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::GlobalState;

/// Default location of the state file, relative to the working directory
pub const DEFAULT_STATE_PATH: &str = ".rtfstate";

/// Serialize the state the way it is stored on disk
pub fn to_pretty_json(state: &GlobalState) -> serde_json::Result<String> {
    // Going through Value sorts every object by key
    let value = serde_json::to_value(state)?;
    let mut json = serde_json::to_string_pretty(&value)?;
    json.push('\n');
    Ok(json)
}

/// Handle on the state file
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state from disk; a missing or empty file is an empty state
    pub fn load(&self) -> Result<GlobalState> {
        if !self.path.is_file() {
            debug!("No state file at {:?}, starting from empty state", self.path);
            return Ok(GlobalState::default());
        }

        let content = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read state file '{}'", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(GlobalState::default());
        }

        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Invalid state file '{}'", self.path.display()))
    }

    /// Write the full state, replacing the previous file in one rename
    pub fn write(&self, state: &GlobalState) -> Result<()> {
        let json = to_pretty_json(state).wrap_err("Failed to serialize state")?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, &json)
            .wrap_err_with(|| format!("Failed to write '{}'", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .wrap_err_with(|| format!("Failed to replace state file '{}'", self.path.display()))?;

        debug!("Wrote state with {} platform(s) to {:?}", state.platforms.len(), self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(DEFAULT_STATE_PATH));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_PATH)
    }
}
