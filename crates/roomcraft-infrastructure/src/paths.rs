//! Unified path management for roomcraft files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/roomcraft/         # Config directory (platform specific)
//! ├── config.toml              # Application configuration
//! ├── store/                   # Key-value store (one file per key)
//! │   ├── savedSelection
//! │   └── credential
//! └── logs/                    # Application logs
//!     └── roomcraft.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "roomcraft";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
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

impl From<PathError> for roomcraft_core::RoomcraftError {
    fn from(err: PathError) -> Self {
        roomcraft_core::RoomcraftError::config(err.to_string())
    }
}

/// Resolves every on-disk location used by roomcraft.
///
/// With a base path all locations live under it (used by tests); otherwise
/// they live under the platform config directory.
#[derive(Debug, Clone, Default)]
pub struct RoomcraftPaths {
    base: Option<PathBuf>,
}

impl RoomcraftPaths {
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            base: base_path.map(Path::to_path_buf),
        }
    }

    /// Returns the roomcraft configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.config/roomcraft/`
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Directory backing the file key-value store.
    pub fn store_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("store"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_dir() {
        // Some CI sandboxes have no resolvable config dir
        if let Ok(config_dir) = RoomcraftPaths::default().config_dir() {
            assert!(config_dir.ends_with("roomcraft"));
        }
    }

    #[test]
    fn test_base_path_override() {
        let temp_dir = TempDir::new().unwrap();
        let paths = RoomcraftPaths::new(Some(temp_dir.path()));

        assert_eq!(paths.config_dir().unwrap(), temp_dir.path());
        assert_eq!(paths.config_file().unwrap(), temp_dir.path().join("config.toml"));
        assert_eq!(paths.store_dir().unwrap(), temp_dir.path().join("store"));
        assert_eq!(paths.logs_dir().unwrap(), temp_dir.path().join("logs"));
    }
}
