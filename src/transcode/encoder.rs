//! Image encoder abstraction
//!
//! Every profile writes JPEG, so there is one encoder today; the trait and
//! factory are the seam a second output format would plug into.
//! Progressive output goes through `jpeg-encoder`, which the `image` crate
//! cannot produce.

use super::error::CodecError;
use super::profile::OutputFormat;

/// Settings for a single encode
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
    /// Multi-scan JPEG
    pub progressive: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: 80,
            progressive: false,
        }
    }
}

impl EncodeOptions {
    /// Create settings with the specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            progressive: false,
        }
    }

    pub fn progressive(mut self, progressive: bool) -> Self {
        self.progressive = progressive;
        self
    }
}

/// Encodes raw RGBA8 pixels (4 bytes per pixel, row-major)
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    fn encode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Baseline or progressive JPEG encoder using the jpeg-encoder crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let w = u16::try_from(width)
            .map_err(|_| CodecError::encode_failed("jpeg", "width exceeds 65535"))?;
        let h = u16::try_from(height)
            .map_err(|_| CodecError::encode_failed("jpeg", "height exceeds 65535"))?;

        // JPEG has no alpha channel
        let rgb = rgba_to_rgb(rgba);

        let mut output = Vec::new();
        let mut encoder = jpeg_encoder::Encoder::new(&mut output, options.quality);
        encoder.set_progressive(options.progressive);
        encoder
            .encode(&rgb, w, h, jpeg_encoder::ColorType::Rgb)
            .map_err(|e| CodecError::encode_failed("jpeg", e.to_string()))?;

        Ok(output)
    }
}

/// Picks the encoder for an output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
        }
    }
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    rgb
}
