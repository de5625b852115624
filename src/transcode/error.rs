//! Codec error types
//!
//! Raised by `ImageCodec` implementations. The pipeline folds all of them
//! into `ErrorKind::TranscodeFailure`.

use std::fmt;

/// Errors that can occur while decoding, resizing or encoding an image
#[derive(Debug, Clone)]
pub enum CodecError {
    // === Decoding Errors ===
    /// Image format is not supported by the codec
    UnsupportedFormat { format: String },
    /// Failed to decode image data
    DecodeFailed { message: String },
    /// Image dimensions exceed safety limits (decompression bomb protection)
    ImageBombDetected {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    // === Processing Errors ===
    /// Resize operation failed
    ResizeFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            CodecError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            CodecError::ImageBombDetected {
                width,
                height,
                pixels,
                max_pixels,
            } => {
                write!(
                    f,
                    "Image dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                    width, height, pixels, max_pixels
                )
            }
            CodecError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            CodecError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl CodecError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        CodecError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        CodecError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        CodecError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn image_bomb(width: u32, height: u32, max_pixels: u64) -> Self {
        CodecError::ImageBombDetected {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}
