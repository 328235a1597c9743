//! Logging setup

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize the global tracing subscriber from configuration.
///
/// `RUST_LOG` overrides the configured level. Format is `text` or `json`;
/// when a file path is set, output goes there instead of stdout.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<()> {
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = config.map(|c| c.format == "json").unwrap_or(false);
    let file = match config.and_then(|c| c.file.as_ref()) {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match (json, file) {
        (true, Some(file)) => builder
            .json()
            .with_writer(file)
            .with_ansi(false)
            .try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(file)) => builder.with_writer(file).with_ansi(false).try_init(),
        (false, None) => builder.try_init(),
    };

    result.map_err(|e| Error::ConfigError(format!("Failed to initialize logging: {}", e)))
}
