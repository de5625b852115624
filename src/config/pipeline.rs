//! Transcode scheduling configuration.
//!
//! There is no default deadline: `transcode_timeout_ms` is opt-in, and a
//! per-request deadline on `UploadRequest` takes precedence over it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::DEFAULT_MAX_SOURCE_PIXELS;

fn default_max_concurrent_transcodes() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}

/// Worker pool settings for CPU-bound image work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on transcodes running at once (default: available parallelism)
    #[serde(default = "default_max_concurrent_transcodes")]
    pub max_concurrent_transcodes: usize,
    /// Deadline for the transcode step in milliseconds (default: none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcode_timeout_ms: Option<u64>,
    /// Largest decoded image accepted, in pixels (default: 100 megapixels)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transcodes: default_max_concurrent_transcodes(),
            transcode_timeout_ms: None,
            max_source_pixels: default_max_source_pixels(),
        }
    }
}

impl PipelineConfig {
    pub fn transcode_timeout(&self) -> Option<Duration> {
        self.transcode_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_transcodes == 0 {
            return Err("pipeline.max_concurrent_transcodes must be at least 1".to_string());
        }
        if self.transcode_timeout_ms == Some(0) {
            return Err("pipeline.transcode_timeout_ms must be greater than 0".to_string());
        }
        if self.max_source_pixels == 0 {
            return Err("pipeline.max_source_pixels must be greater than 0".to_string());
        }
        Ok(())
    }
}
