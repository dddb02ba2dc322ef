//! Wiring of the production stack: config, logging, file store and the
//! Gemini client behind a [`DesignWorkflow`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use roomcraft_core::ProgressSink;
use roomcraft_core::config::RoomcraftConfig;
use roomcraft_infrastructure::logging::{WorkerGuard, init_logging};
use roomcraft_infrastructure::{ConfigService, FileKeyValueStore, RoomcraftPaths};
use roomcraft_interaction::GeminiImageClient;

use crate::retry::RetryPolicy;
use crate::workflow::DesignWorkflow;

/// The workflow as assembled for real use.
pub type AppWorkflow = DesignWorkflow<GeminiImageClient, FileKeyValueStore>;

/// Options for [`AppBootstrap::init`].
#[derive(Default)]
pub struct BootstrapOptions<'a> {
    /// Overrides the config directory; the platform default is used when unset.
    pub base_dir: Option<&'a Path>,
    /// Install the global tracing subscriber.
    pub install_logging: bool,
    pub progress: Option<Arc<dyn ProgressSink>>,
}

pub struct AppBootstrap {
    pub workflow: Arc<AppWorkflow>,
    pub config: RoomcraftConfig,
    pub retry_policy: RetryPolicy,
    pub paths: RoomcraftPaths,
    _log_guard: Option<WorkerGuard>,
}

impl AppBootstrap {
    pub fn init(options: BootstrapOptions<'_>) -> Result<Self> {
        let paths = RoomcraftPaths::new(options.base_dir);
        let config_service =
            ConfigService::new(&paths).map_err(|e| anyhow!("Failed to resolve config path: {}", e))?;
        let config = config_service.get_config();

        let log_guard = if options.install_logging {
            let logs_dir = paths
                .logs_dir()
                .map_err(|e| anyhow!("Failed to resolve logs directory: {}", e))?;
            match init_logging(&config.logging, &logs_dir) {
                Ok(guard) => guard,
                Err(e) => {
                    // A subscriber installed by the embedding process takes precedence
                    tracing::warn!("[Bootstrap] Logging not initialised: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let store_dir = paths
            .store_dir()
            .map_err(|e| anyhow!("Failed to resolve store directory: {}", e))?;
        tracing::info!("[Bootstrap] Using store directory: {:?}", store_dir);
        let store = FileKeyValueStore::new(store_dir);

        let client = GeminiImageClient::from_config(&config.provider)
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        tracing::info!("[Bootstrap] Image model: {}", client.model());

        let mut workflow = DesignWorkflow::new(client, store);
        if let Some(progress) = options.progress {
            workflow = workflow.with_progress(progress);
        }
        workflow.start_session();

        tracing::info!(
            "[Bootstrap] Ready (credential stored: {}, saved design: {})",
            workflow.has_credential(),
            workflow.has_saved_design()
        );

        Ok(Self {
            workflow: Arc::new(workflow),
            retry_policy: RetryPolicy::from_config(&config.retry),
            config,
            paths,
            _log_guard: log_guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcraft_core::{SelectedItem, Stage};
    use tempfile::TempDir;

    fn init(dir: &TempDir) -> AppBootstrap {
        AppBootstrap::init(BootstrapOptions {
            base_dir: Some(dir.path()),
            ..BootstrapOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_init_writes_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let app = init(&temp_dir);

        assert_eq!(app.config, RoomcraftConfig::default());
        assert!(app.paths.config_file().unwrap().exists());
        assert_eq!(app.workflow.stage(), Stage::Upload);
        assert!(!app.workflow.has_credential());
        assert_eq!(app.retry_policy, RetryPolicy::default());
    }

    #[test]
    fn test_state_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        {
            let app = init(&temp_dir);
            app.workflow.save_credential("secret").unwrap();
            assert!(app.workflow.save_design(&[SelectedItem::new("bed", "Bed", "center")]));
        }

        let app = init(&temp_dir);
        assert!(app.workflow.has_credential());
        assert!(app.workflow.has_saved_design());
        assert_eq!(app.workflow.saved_design().unwrap().len(), 1);
    }

    #[test]
    fn test_config_file_drives_policy() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[retry]\nmax_attempts = 3\n\n[provider]\nmodel = \"custom-image-model\"\n",
        )
        .unwrap();

        let app = init(&temp_dir);
        assert_eq!(app.retry_policy.max_attempts, 3);
        assert_eq!(app.config.provider.model, "custom-image-model");
    }
}
