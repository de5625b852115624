//! Storage and public URL configuration.
//!
//! Describes where uploads live on disk and how stored files are exposed:
//! - `storage.root` holds `temp/`, `avatars/` and `recipes/`
//! - `public_url` selects the origin for the running environment
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    AVATARS_DIR_NAME, DEFAULT_DEVELOPMENT_ORIGIN, DEFAULT_PUBLIC_PATH_PREFIX,
    DEFAULT_STORAGE_ROOT, RECIPES_DIR_NAME, TEMP_DIR_NAME,
};

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_ROOT)
}

fn default_development_origin() -> String {
    DEFAULT_DEVELOPMENT_ORIGIN.to_string()
}

fn default_path_prefix() -> String {
    DEFAULT_PUBLIC_PATH_PREFIX.to_string()
}

/// On-disk layout of the upload tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory (default: ./uploads)
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl StorageConfig {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR_NAME)
    }

    pub fn avatars_dir(&self) -> PathBuf {
        self.root.join(AVATARS_DIR_NAME)
    }

    pub fn recipes_dir(&self) -> PathBuf {
        self.root.join(RECIPES_DIR_NAME)
    }
}

/// Deployment environment, selects which origin public URLs use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Public URL construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUrlConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Origin for local/dev deployments (default: http://localhost:3000)
    #[serde(default = "default_development_origin")]
    pub development_origin: String,
    /// Origin for production; required when `environment: production`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_origin: Option<String>,
    /// Path under which assets are served (default: /api/v1/uploads)
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
}

impl Default for PublicUrlConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            development_origin: default_development_origin(),
            production_origin: None,
            path_prefix: default_path_prefix(),
        }
    }
}

impl PublicUrlConfig {
    /// Origin for the configured environment, without a trailing slash
    pub fn origin(&self) -> &str {
        let origin = match self.environment {
            Environment::Production => self
                .production_origin
                .as_deref()
                .unwrap_or(&self.development_origin),
            Environment::Development => &self.development_origin,
        };
        origin.trim_end_matches('/')
    }

    /// `{origin}{path_prefix}`, e.g. `https://api.example.com/api/v1/uploads`
    pub fn base_url(&self) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        format!("{}{}", self.origin(), prefix)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.environment == Environment::Production {
            match &self.production_origin {
                Some(origin) if !origin.trim().is_empty() => {}
                _ => {
                    return Err(
                        "public_url.production_origin is required when environment is production"
                            .to_string(),
                    )
                }
            }
        }

        for origin in std::iter::once(&self.development_origin).chain(&self.production_origin) {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(format!(
                    "public_url origin '{}' must start with http:// or https://",
                    origin
                ));
            }
        }

        if !self.path_prefix.starts_with('/') {
            return Err(format!(
                "public_url.path_prefix '{}' must start with /",
                self.path_prefix
            ));
        }

        Ok(())
    }
}
