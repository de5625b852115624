// Error types module

use std::fmt;
use std::io;
use thiserror::Error;

use crate::transcode::CodecError;
use crate::validation::{FilenameIssue, Rejection, SizeBound};

/// Coarse failure category callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoFile,
    FilenameInvalid,
    UnsupportedMimeType,
    SizeOutOfBounds,
    SignatureMismatch,
    MaliciousContentDetected,
    TranscodeFailure,
    IoFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoFile => "no_file",
            ErrorKind::FilenameInvalid => "filename_invalid",
            ErrorKind::UnsupportedMimeType => "unsupported_mime_type",
            ErrorKind::SizeOutOfBounds => "size_out_of_bounds",
            ErrorKind::SignatureMismatch => "signature_mismatch",
            ErrorKind::MaliciousContentDetected => "malicious_content_detected",
            ErrorKind::TranscodeFailure => "transcode_failure",
            ErrorKind::IoFailure => "io_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the ingestion pipeline
///
/// `Display` may include paths and codec detail and is meant for logs.
/// Use [`UploadError::public_message`] for anything shown to a client.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload failed validation; nothing was written
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// A caller-supplied output base name or stored asset name is unusable
    #[error("Invalid asset name: {0}")]
    InvalidName(FilenameIssue),

    /// The codec could not decode, resize or encode the image
    #[error("Transcode failed: {0}")]
    Transcode(#[from] CodecError),

    /// The transcode step exceeded its deadline
    #[error("Transcode timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The blocking worker running the transcode panicked or was cancelled
    #[error("Transcode worker failed: {0}")]
    WorkerFailed(String),

    /// Filesystem failure
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    pub fn io(operation: &'static str, source: io::Error) -> Self {
        UploadError::Io { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::Rejected(rejection) => match rejection {
                Rejection::NoFile => ErrorKind::NoFile,
                Rejection::FilenameInvalid(_) => ErrorKind::FilenameInvalid,
                Rejection::UnsupportedMimeType { .. } => ErrorKind::UnsupportedMimeType,
                Rejection::SizeOutOfBounds { .. } => ErrorKind::SizeOutOfBounds,
                Rejection::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
                Rejection::MaliciousContent { .. } => ErrorKind::MaliciousContentDetected,
            },
            UploadError::InvalidName(_) => ErrorKind::FilenameInvalid,
            UploadError::Transcode(_)
            | UploadError::Timeout { .. }
            | UploadError::WorkerFailed(_) => ErrorKind::TranscodeFailure,
            UploadError::Io { .. } => ErrorKind::IoFailure,
        }
    }

    /// True when the failure is the client's fault (bad input)
    pub fn is_client_error(&self) -> bool {
        self.to_http_status() < 500
    }

    /// Maps upload errors to HTTP status codes
    ///
    /// Status mapping:
    /// - NoFile, FilenameInvalid, SignatureMismatch, MaliciousContent → 400
    /// - SizeOutOfBounds → 413 when too large, 400 when too small
    /// - UnsupportedMimeType → 415 (Unsupported Media Type)
    /// - Transcode (codec) → 422 (the bytes looked right but do not decode)
    /// - Timeout → 504
    /// - WorkerFailed, Io → 500
    pub fn to_http_status(&self) -> u16 {
        match self {
            UploadError::Rejected(Rejection::SizeOutOfBounds {
                bound: SizeBound::TooLarge { .. },
                ..
            }) => 413,
            UploadError::Rejected(Rejection::UnsupportedMimeType { .. }) => 415,
            UploadError::Rejected(_) | UploadError::InvalidName(_) => 400,
            UploadError::Transcode(_) => 422,
            UploadError::Timeout { .. } => 504,
            UploadError::WorkerFailed(_) | UploadError::Io { .. } => 500,
        }
    }

    /// Human-readable reason safe to return to the uploader.
    ///
    /// Never contains filesystem paths, OS error text or codec internals.
    pub fn public_message(&self) -> String {
        match self {
            UploadError::Rejected(rejection) => rejection.to_string(),
            UploadError::InvalidName(issue) => format!("Invalid asset name: {}", issue),
            UploadError::Transcode(_) => {
                "The image could not be processed; it may be corrupted".to_string()
            }
            UploadError::Timeout { .. } => "Image processing took too long".to_string(),
            UploadError::WorkerFailed(_) => "Image processing failed".to_string(),
            UploadError::Io { .. } => "The upload could not be stored".to_string(),
        }
    }
}
