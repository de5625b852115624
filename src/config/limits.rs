//! Upload limit configuration.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_FILENAME_LENGTH, DEFAULT_MAX_FILE_SIZE, DEFAULT_MIN_FILE_SIZE,
    DEFAULT_TEXT_SCAN_WINDOW,
};

fn default_min_file_size() -> usize {
    DEFAULT_MIN_FILE_SIZE
}

fn default_max_file_size() -> usize {
    DEFAULT_MAX_FILE_SIZE
}

fn default_text_scan_window() -> usize {
    DEFAULT_TEXT_SCAN_WINDOW
}

fn default_max_filename_length() -> usize {
    DEFAULT_MAX_FILENAME_LENGTH
}

/// Validation limits applied to every upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Smallest accepted upload in bytes (default: 1 KiB)
    #[serde(default = "default_min_file_size")]
    pub min_file_size: usize,
    /// Largest accepted upload in bytes (default: 5 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Leading bytes covered by the text-pattern scan (default: 8 KiB)
    #[serde(default = "default_text_scan_window")]
    pub text_scan_window: usize,
    /// Maximum filename length in characters (default: 255)
    #[serde(default = "default_max_filename_length")]
    pub max_filename_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_file_size: default_min_file_size(),
            max_file_size: default_max_file_size(),
            text_scan_window: default_text_scan_window(),
            max_filename_length: default_max_filename_length(),
        }
    }
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size == 0 {
            return Err("limits.max_file_size must be greater than 0".to_string());
        }
        if self.min_file_size > self.max_file_size {
            return Err(format!(
                "limits.min_file_size ({}) exceeds limits.max_file_size ({})",
                self.min_file_size, self.max_file_size
            ));
        }
        if self.text_scan_window == 0 {
            return Err("limits.text_scan_window must be greater than 0".to_string());
        }
        if self.max_filename_length == 0 {
            return Err("limits.max_filename_length must be greater than 0".to_string());
        }
        Ok(())
    }
}
