//! Image codec capability
//!
//! The transcoder only talks to an [`ImageCodec`]; it never touches a
//! concrete imaging library. [`RasterCodec`] is the production
//! implementation: `image` for decoding, `fast_image_resize` (Lanczos3) for
//! resampling and the per-format encoders from `encoder`.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::encoder::{EncodeOptions, EncoderFactory};
use super::error::CodecError;
use super::geometry::{plan_resize, CropRect};
use super::orientation::{apply_orientation, read_orientation};
use super::profile::{FitMode, OutputFormat};
use crate::constants::DEFAULT_MAX_SOURCE_PIXELS;

/// Decoded pixels in RGBA8, row-major, 4 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CodecError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(CodecError::decode_failed(format!(
                "pixel buffer of {} bytes does not match {}x{} RGBA",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn crop(&self, rect: CropRect) -> DecodedImage {
        let stride = self.width as usize * 4;
        let row_len = rect.width as usize * 4;
        let mut pixels = Vec::with_capacity(row_len * rect.height as usize);
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * stride + rect.x as usize * 4;
            pixels.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        DecodedImage {
            width: rect.width,
            height: rect.height,
            pixels,
        }
    }
}

/// Decode / resize / encode capability consumed by the transcoder
pub trait ImageCodec: Send + Sync {
    /// Decode an encoded image into upright RGBA pixels
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Fit `image` into the target box without upscaling
    fn resize(
        &self,
        image: &DecodedImage,
        width: Option<u32>,
        height: Option<u32>,
        fit: FitMode,
    ) -> Result<DecodedImage, CodecError>;

    fn encode(
        &self,
        image: &DecodedImage,
        format: OutputFormat,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Read pixel dimensions from an encoded image's header
    fn dimensions(&self, data: &[u8]) -> Result<(u32, u32), CodecError>;
}

/// Default codec backed by the `image` and `fast_image_resize` crates
#[derive(Debug, Clone)]
pub struct RasterCodec {
    /// Decompression-bomb guard, checked from the header before decoding
    max_pixels: u64,
    /// Apply the EXIF Orientation tag before resizing
    auto_orient: bool,
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_SOURCE_PIXELS,
            auto_orient: true,
        }
    }
}

impl RasterCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn with_auto_orient(mut self, auto_orient: bool) -> Self {
        self.auto_orient = auto_orient;
        self
    }

    fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, CodecError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CodecError::decode_failed(e.to_string()))?;
        if reader.format().is_none() {
            return Err(CodecError::unsupported_format("unrecognized"));
        }
        Ok(reader)
    }
}

impl ImageCodec for RasterCodec {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, CodecError> {
        let (width, height) = self.dimensions(data)?;
        if width as u64 * height as u64 > self.max_pixels {
            return Err(CodecError::image_bomb(width, height, self.max_pixels));
        }

        let img = Self::reader(data)?
            .decode()
            .map_err(|e| CodecError::decode_failed(e.to_string()))?;

        let img = match read_orientation(data) {
            Some(orientation) if self.auto_orient => apply_orientation(img, orientation),
            _ => img,
        };

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        DecodedImage::new(width, height, rgba.into_raw())
    }

    fn resize(
        &self,
        image: &DecodedImage,
        width: Option<u32>,
        height: Option<u32>,
        fit: FitMode,
    ) -> Result<DecodedImage, CodecError> {
        let plan = plan_resize(image.width, image.height, width, height, fit);
        if plan.is_identity(image.width, image.height) {
            return Ok(image.clone());
        }

        let cropped = match plan.crop {
            Some(rect) => image.crop(rect),
            None => image.clone(),
        };
        if cropped.width == plan.width && cropped.height == plan.height {
            return Ok(cropped);
        }

        resample(cropped, plan.width, plan.height)
    }

    fn encode(
        &self,
        image: &DecodedImage,
        format: OutputFormat,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        EncoderFactory::create(format)
            .encode(&image.pixels, image.width, image.height, options)
    }

    fn dimensions(&self, data: &[u8]) -> Result<(u32, u32), CodecError> {
        Self::reader(data)?
            .into_dimensions()
            .map_err(|e| CodecError::decode_failed(e.to_string()))
    }
}

/// Resample with fast-image-resize using the Lanczos3 filter
fn resample(src: DecodedImage, target_w: u32, target_h: u32) -> Result<DecodedImage, CodecError> {
    let src_width =
        NonZeroU32::new(src.width).ok_or_else(|| CodecError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(src.height)
        .ok_or_else(|| CodecError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| CodecError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| CodecError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(src_width, src_height, src.pixels, PixelType::U8x4)
        .map_err(|e| CodecError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| CodecError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    DecodedImage::new(target_w, target_h, dst_image.into_vec())
}
