//! Logging initialisation.
//!
//! Installs a global `tracing` subscriber: a stderr `fmt` layer plus, when
//! configured, a daily rolling log file under the logs directory.

use roomcraft_core::config::LoggingConfig;
use roomcraft_core::{Result, RoomcraftError};
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE_PREFIX: &str = "roomcraft.log";

/// Builds the filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber.
///
/// Returns the file appender's guard when file logging is enabled; keep it
/// alive for the lifetime of the process so buffered lines get flushed.
pub fn init_logging(config: &LoggingConfig, logs_dir: &Path) -> Result<Option<WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = if config.log_to_file {
        std::fs::create_dir_all(logs_dir)?;
        let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RoomcraftError::config(format!("Failed to install tracing subscriber: {e}")))?;

    tracing::info!(level = %config.level, log_to_file = config.log_to_file, "Logging initialised");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid filter".to_string(),
            log_to_file: false,
        };
        // Must not panic regardless of RUST_LOG in the test environment
        let _ = build_filter(&config);
    }
}
