//! Fixed transform profiles
//!
//! Profiles are compile-time constants; requests pick one through their
//! asset category and cannot override any field.

use std::fmt;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to fit the image within target dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Scale to fit within the box, preserving aspect ratio and all content
    Contain,
    /// Fill the box exactly, cropping the overflow around the centre
    Cover,
}

/// Per-output transform settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformProfile {
    /// Profile name, used in logs and metrics
    pub name: &'static str,
    /// Target width in pixels; `None` leaves width unconstrained
    pub width: Option<u32>,
    /// Target height in pixels; `None` leaves height unconstrained
    pub height: Option<u32>,
    pub fit: FitMode,
    pub format: OutputFormat,
    /// Encoder quality (1-100)
    pub quality: u8,
    /// Progressive (multi-scan) JPEG
    pub progressive: bool,
    /// Appended to the base name before the extension
    pub suffix: &'static str,
    /// Secondary derivative produced alongside this one
    pub thumbnail: Option<&'static TransformProfile>,
}

impl TransformProfile {
    /// `{base_name}{suffix}.{ext}`
    pub fn output_filename(&self, base_name: &str) -> String {
        format!("{}{}.{}", base_name, self.suffix, self.format.extension())
    }
}

/// 300x300 square avatar, centre-cropped
pub const AVATAR: TransformProfile = TransformProfile {
    name: "avatar",
    width: Some(300),
    height: Some(300),
    fit: FitMode::Cover,
    format: OutputFormat::Jpeg,
    quality: 90,
    progressive: false,
    suffix: "",
    thumbnail: None,
};

/// Recipe listing thumbnail
pub const RECIPE_THUMB: TransformProfile = TransformProfile {
    name: "recipe-thumb",
    width: Some(400),
    height: Some(300),
    fit: FitMode::Contain,
    format: OutputFormat::Jpeg,
    quality: 80,
    progressive: false,
    suffix: "_thumb",
    thumbnail: None,
};

/// Recipe hero image; also produces `RECIPE_THUMB`
pub const RECIPE_MAIN: TransformProfile = TransformProfile {
    name: "recipe-main",
    width: Some(1200),
    height: Some(800),
    fit: FitMode::Contain,
    format: OutputFormat::Jpeg,
    quality: 85,
    progressive: true,
    suffix: "",
    thumbnail: Some(&RECIPE_THUMB),
};
