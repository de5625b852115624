//! Image transcoding
//!
//! Turns a verified source image into normalized derivatives:
//! - Decode (with decompression-bomb guard and EXIF auto-orient)
//! - Resize per profile without upscaling (`Contain` or centred `Cover`)
//! - Re-encode to the profile's format and quality
//!
//! The transcoder writes files but never deletes them; cleaning up after a
//! failed request is the pipeline's job.

pub mod codec;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod orientation;
pub mod profile;

pub use codec::{DecodedImage, ImageCodec, RasterCodec};
pub use encoder::{EncodeOptions, EncoderFactory, ImageEncoder, JpegEncoder};
pub use error::CodecError;
pub use geometry::{contain_dimensions, plan_resize, CropRect, ResizePlan};
pub use orientation::Orientation;
pub use profile::{FitMode, OutputFormat, TransformProfile, AVATAR, RECIPE_MAIN, RECIPE_THUMB};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::UploadError;

/// Outcome of a successful transform
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedImageResult {
    pub main_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    /// Source size in bytes
    pub original_size: u64,
    /// Main derivative size in bytes
    pub optimized_size: u64,
    /// Percentage of bytes saved; negative when the output grew
    pub compression_ratio: f64,
    /// Actual pixel size of the main derivative
    pub width: u32,
    pub height: u32,
}

/// `(original - optimized) / original * 100`, or 0 for an empty original
pub fn compression_ratio(original_size: u64, optimized_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (original_size as f64 - optimized_size as f64) / original_size as f64 * 100.0
}

/// One written derivative
struct Rendered {
    path: PathBuf,
    size: u64,
    width: u32,
    height: u32,
}

/// Applies [`TransformProfile`]s through an [`ImageCodec`]
#[derive(Debug, Clone, Default)]
pub struct Transcoder<C: ImageCodec = RasterCodec> {
    codec: C,
}

impl<C: ImageCodec> Transcoder<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Produce the main derivative for `profile`, ignoring any thumbnail
    pub fn transform(
        &self,
        source: &Path,
        dest_dir: &Path,
        base_name: &str,
        profile: &TransformProfile,
    ) -> Result<OptimizedImageResult, UploadError> {
        let (original_size, image) = self.load(source)?;
        let main = self.render(&image, dest_dir, base_name, profile)?;
        Ok(Self::summarize(original_size, main, None))
    }

    /// Produce only the derivative for a thumbnail profile
    pub fn transform_thumbnail(
        &self,
        source: &Path,
        dest_dir: &Path,
        base_name: &str,
        thumbnail: &TransformProfile,
    ) -> Result<PathBuf, UploadError> {
        let (_, image) = self.load(source)?;
        self.render(&image, dest_dir, base_name, thumbnail)
            .map(|rendered| rendered.path)
    }

    /// Produce the main derivative and, when the profile asks for one, its
    /// thumbnail. The source is decoded once for both.
    pub fn transform_with_thumbnail(
        &self,
        source: &Path,
        dest_dir: &Path,
        base_name: &str,
        profile: &TransformProfile,
    ) -> Result<OptimizedImageResult, UploadError> {
        let (original_size, image) = self.load(source)?;
        let main = self.render(&image, dest_dir, base_name, profile)?;
        let thumbnail = match profile.thumbnail {
            Some(thumb) => Some(self.render(&image, dest_dir, base_name, thumb)?.path),
            None => None,
        };
        Ok(Self::summarize(original_size, main, thumbnail))
    }

    fn load(&self, source: &Path) -> Result<(u64, DecodedImage), UploadError> {
        let original_size = fs::metadata(source)
            .map_err(|e| UploadError::io("stat source image", e))?
            .len();
        let data = fs::read(source).map_err(|e| UploadError::io("read source image", e))?;
        let image = self.codec.decode(&data)?;
        Ok((original_size, image))
    }

    fn render(
        &self,
        image: &DecodedImage,
        dest_dir: &Path,
        base_name: &str,
        profile: &TransformProfile,
    ) -> Result<Rendered, UploadError> {
        let resized = self
            .codec
            .resize(image, profile.width, profile.height, profile.fit)?;
        let options = EncodeOptions::with_quality(profile.quality).progressive(profile.progressive);
        let encoded = self.codec.encode(&resized, profile.format, options)?;

        let path = dest_dir.join(profile.output_filename(base_name));
        fs::write(&path, &encoded).map_err(|e| UploadError::io("write derivative", e))?;

        // report what actually landed on disk
        let size = fs::metadata(&path)
            .map_err(|e| UploadError::io("stat derivative", e))?
            .len();
        let written = fs::read(&path).map_err(|e| UploadError::io("read derivative", e))?;
        let (width, height) = self.codec.dimensions(&written)?;

        tracing::debug!(
            profile = profile.name,
            width,
            height,
            size,
            "Derivative written"
        );

        Ok(Rendered {
            path,
            size,
            width,
            height,
        })
    }

    fn summarize(
        original_size: u64,
        main: Rendered,
        thumbnail_path: Option<PathBuf>,
    ) -> OptimizedImageResult {
        OptimizedImageResult {
            compression_ratio: compression_ratio(original_size, main.size),
            main_path: main.path,
            thumbnail_path,
            original_size,
            optimized_size: main.size,
            width: main.width,
            height: main.height,
        }
    }
}
