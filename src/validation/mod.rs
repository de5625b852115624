//! Upload validation
//!
//! Rejects unsafe or malformed uploads before any filesystem write or
//! decode. Checks run cheapest-first and stop at the first failure:
//!
//! 1. presence
//! 2. filename safety
//! 3. declared MIME allow-list
//! 4. size bounds
//! 5. magic-number signature vs declared MIME
//! 6. text-pattern scan (leading window only)
//! 7. binary-signature scan (whole buffer)
//!
//! Validation is a pure function of its inputs.

pub mod content;
pub mod filename;
pub mod signature;

use std::fmt;
use thiserror::Error;

use crate::config::LimitsConfig;

pub use filename::{check_base_name, check_filename, check_stored_name, FilenameIssue};
pub use signature::{ImageFormat, ALLOWED_MIME_TYPES};

/// Which size limit an upload violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBound {
    TooSmall { min: usize },
    TooLarge { max: usize },
}

impl fmt::Display for SizeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBound::TooSmall { min } => write!(f, "too small (minimum {} bytes)", min),
            SizeBound::TooLarge { max } => write!(f, "too large (maximum {} bytes)", max),
        }
    }
}

/// A specific reason for refusing an upload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No file was provided")]
    NoFile,

    #[error("Invalid filename: {0}")]
    FilenameInvalid(FilenameIssue),

    #[error("Unsupported file type '{mime}'; allowed types are image/jpeg, image/png, image/gif, image/webp")]
    UnsupportedMimeType { mime: String },

    #[error("File is {bound}")]
    SizeOutOfBounds { size: usize, bound: SizeBound },

    #[error("File content does not match the declared type {declared}")]
    SignatureMismatch {
        declared: ImageFormat,
        detected: Option<ImageFormat>,
    },

    #[error("File contains potentially malicious content")]
    MaliciousContent { pattern: &'static str },
}

impl Rejection {
    /// Short machine label, used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::NoFile => "no_file",
            Rejection::FilenameInvalid(_) => "filename_invalid",
            Rejection::UnsupportedMimeType { .. } => "unsupported_mime_type",
            Rejection::SizeOutOfBounds { .. } => "size_out_of_bounds",
            Rejection::SignatureMismatch { .. } => "signature_mismatch",
            Rejection::MaliciousContent { .. } => "malicious_content",
        }
    }
}

/// Pass (with the verified format) or the first rejection encountered
pub type ValidationOutcome = Result<ImageFormat, Rejection>;

/// Tunable limits for the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub min_file_size: usize,
    pub max_file_size: usize,
    pub text_scan_window: usize,
    pub max_filename_length: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for ValidationPolicy {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            min_file_size: limits.min_file_size,
            max_file_size: limits.max_file_size,
            text_scan_window: limits.text_scan_window,
            max_filename_length: limits.max_filename_length,
        }
    }
}

/// Stateless upload validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Run every check in order against an upload.
    ///
    /// `size_bytes` is the size reported by the transport (multipart part
    /// length); it is checked against the limits, while the signature and
    /// content scans always look at `data` itself.
    pub fn validate(
        &self,
        data: &[u8],
        declared_name: &str,
        declared_mime: &str,
        size_bytes: usize,
    ) -> ValidationOutcome {
        if data.is_empty() || declared_name.is_empty() {
            return Err(Rejection::NoFile);
        }

        check_filename(declared_name, self.policy.max_filename_length)
            .map_err(Rejection::FilenameInvalid)?;

        let declared =
            ImageFormat::from_mime(declared_mime).ok_or_else(|| Rejection::UnsupportedMimeType {
                mime: declared_mime.to_string(),
            })?;

        self.check_size(size_bytes)?;

        let detected = ImageFormat::sniff(data);
        if detected != Some(declared) {
            return Err(Rejection::SignatureMismatch { declared, detected });
        }

        if let Some(pattern) = content::scan_text(data, self.policy.text_scan_window) {
            return Err(Rejection::MaliciousContent { pattern });
        }

        if let Some(pattern) = content::scan_binary(data) {
            return Err(Rejection::MaliciousContent { pattern });
        }

        Ok(declared)
    }

    fn check_size(&self, size: usize) -> Result<(), Rejection> {
        if size < self.policy.min_file_size {
            return Err(Rejection::SizeOutOfBounds {
                size,
                bound: SizeBound::TooSmall {
                    min: self.policy.min_file_size,
                },
            });
        }

        if size > self.policy.max_file_size {
            return Err(Rejection::SizeOutOfBounds {
                size,
                bound: SizeBound::TooLarge {
                    max: self.policy.max_file_size,
                },
            });
        }

        Ok(())
    }
}
