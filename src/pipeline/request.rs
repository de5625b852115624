//! Request and response types for the ingestion pipeline

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::transcode::{TransformProfile, AVATAR, RECIPE_MAIN};

/// What an upload is for; selects the transform profile and storage directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Avatar,
    Recipe,
}

impl AssetCategory {
    /// Path segment used in public URLs, also the metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Avatar => "avatar",
            AssetCategory::Recipe => "recipe",
        }
    }

    pub fn profile(&self) -> &'static TransformProfile {
        match self {
            AssetCategory::Avatar => &AVATAR,
            AssetCategory::Recipe => &RECIPE_MAIN,
        }
    }

    /// Directory holding this category's derivatives
    pub fn directory(&self, storage: &StorageConfig) -> PathBuf {
        match self {
            AssetCategory::Avatar => storage.avatars_dir(),
            AssetCategory::Recipe => storage.recipes_dir(),
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avatar" => Ok(AssetCategory::Avatar),
            "recipe" => Ok(AssetCategory::Recipe),
            other => Err(format!(
                "unknown asset category '{}' (expected avatar or recipe)",
                other
            )),
        }
    }
}

/// One upload, as handed over by the transport layer
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    /// Client-declared filename; screened but never used as a path
    pub filename: String,
    /// Client-declared Content-Type
    pub mime: String,
    pub category: AssetCategory,
    /// Output name without extension; defaults to the generated request id
    pub base_name: Option<String>,
    /// Deadline for the transcode step; overrides `pipeline.transcode_timeout_ms`
    pub deadline: Option<Duration>,
}

impl UploadRequest {
    pub fn new(
        data: impl Into<Bytes>,
        filename: impl Into<String>,
        mime: impl Into<String>,
        category: AssetCategory,
    ) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            mime: mime.into(),
            category,
            base_name: None,
            deadline: None,
        }
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Pixel size of the main derivative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Successful upload as reported to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedPublicResult {
    pub optimized_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub original_size: u64,
    pub optimized_size: u64,
    pub compression_ratio: f64,
    pub dimensions: Dimensions,
}
