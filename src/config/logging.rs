//! Logging output configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOG_LEVEL;

fn default_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, for log aggregation
    #[default]
    Json,
    /// Human-readable, for terminals
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Filter directive used when RUST_LOG is unset (default: info)
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
        }
    }
}
