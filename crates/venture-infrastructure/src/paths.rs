//! Path management for Venture configuration files.
//!
//! All durable client state lives under the platform config directory
//! (`~/.config/venture/` on Linux/macOS).

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for the Venture client.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/venture/           # Config directory
/// └── ui_state.toml            # Persisted UI preferences
/// ```
pub struct VenturePaths;

impl VenturePaths {
    /// Returns the Venture configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("venture"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the persisted UI state file.
    pub fn ui_state_path() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("ui_state.toml"))
    }
}
