// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod limits;
pub mod logging;
pub mod pipeline;
pub mod storage;

pub use limits::LimitsConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use storage::{Environment, PublicUrlConfig, StorageConfig};

/// Top-level configuration for the ingestion pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub public_url: PublicUrlConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl UploadConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // Every referenced variable must be set
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage.root.as_os_str().is_empty() {
            return Err("storage.root cannot be empty".to_string());
        }

        self.public_url.validate()?;
        self.limits.validate()?;
        self.pipeline.validate()?;

        Ok(())
    }
}
