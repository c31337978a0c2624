//! Logging setup
//!
//! Console output goes to stderr so report output on stdout stays clean.
//! When a log file is configured, a second non-blocking writer appends to it.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::{AppError, AppResult};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be held for the life of the process to flush the file writer.
pub fn init_logging(config: &LoggingConfig) -> AppResult<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| AppError::InvalidLogLevel {
            level: config.level.clone(),
            message: e.to_string(),
        })?,
    };

    let (file_layer, guard) = match config.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)?;
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_target(true).with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Other(anyhow::anyhow!("Logging already initialized: {}", e)))?;

    Ok(guard)
}
