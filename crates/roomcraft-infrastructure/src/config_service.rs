//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` under the roomcraft
//! config directory.

use crate::paths::RoomcraftPaths;
use crate::storage::AtomicTextFile;
use roomcraft_core::config::RoomcraftConfig;
use roomcraft_core::Result;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<RoomcraftConfig>>>,
}

impl ConfigService {
    /// Creates a service for the config file resolved by `paths`.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(paths: &RoomcraftPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    /// Creates a service for an explicit config file path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file is created with defaults. An unreadable or invalid
    /// file falls back to defaults and is left untouched.
    pub fn get_config(&self) -> RoomcraftConfig {
        // Check if already cached
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config();

        // Cache it
        {
            let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    fn load_config(&self) -> RoomcraftConfig {
        let file = AtomicTextFile::new(self.path.clone());
        match file.load() {
            Ok(Some(content)) => match toml::from_str::<RoomcraftConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "Invalid config file, using defaults: {}", e);
                    RoomcraftConfig::default()
                }
            },
            Ok(None) => {
                let config = RoomcraftConfig::default();
                if let Err(e) = Self::write_default(&file, &config) {
                    tracing::warn!(path = %self.path.display(), "Failed to write default config: {}", e);
                }
                config
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read config file, using defaults: {}", e);
                RoomcraftConfig::default()
            }
        }
    }

    fn write_default(file: &AtomicTextFile, config: &RoomcraftConfig) -> Result<()> {
        let content = toml::to_string_pretty(config)?;
        file.save(&content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        assert_eq!(service.get_config(), RoomcraftConfig::default());
        assert!(path.exists());

        let written: RoomcraftConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, RoomcraftConfig::default());
    }

    #[test]
    fn test_reads_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[provider]\nrequest_timeout_secs = 30\n").unwrap();

        let config = ConfigService::with_path(path).get_config();
        assert_eq!(config.provider.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[provider\nbroken").unwrap();

        let service = ConfigService::with_path(path.clone());
        assert_eq!(service.get_config(), RoomcraftConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[provider\nbroken");
    }

    #[test]
    fn test_cache_and_invalidate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());
        service.get_config();

        std::fs::write(&path, "[retry]\nmax_attempts = 4\n").unwrap();
        assert_eq!(service.get_config().retry.max_attempts, 1);

        service.invalidate_cache();
        assert_eq!(service.get_config().retry.max_attempts, 4);
    }
}
