// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Build the level filter: `RUST_LOG` wins, otherwise the configured level
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, Box<dyn Error>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| format!("Invalid log level '{}': {}", config.level, e).into()),
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON or human-readable formatting, per `logging.format`
/// - Filtering from `RUST_LOG`, falling back to `logging.level`
/// - Output to stderr, so command output on stdout stays machine-readable
///
/// # Errors
///
/// Returns an error if the level directive does not parse or a global
/// subscriber is already installed.
///
/// # Examples
///
/// ```
/// use platter::config::LoggingConfig;
/// use platter::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
