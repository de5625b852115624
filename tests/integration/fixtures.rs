//! Shared fixtures for the pipeline integration tests
//!
//! Images are generated in-process with the `image` crate; nothing is read
//! from the repository.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat as RasterFormat, RgbImage};
use platter::config::UploadConfig;
use platter::validation::Validator;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Config rooted inside `dir`, with two transcode permits
pub fn config_in(dir: &Path) -> UploadConfig {
    let mut config = UploadConfig::default();
    config.storage.root = dir.join("uploads");
    config.pipeline.max_concurrent_transcodes = 2;
    config
}

/// Sorted file names in `dir`; empty when the directory does not exist
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// xorshift32; deterministic noise without a rand dependency
fn noise(state: &mut u32) -> u8 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    (*state >> 24) as u8
}

/// Gradient with per-pixel noise, so JPEG cannot compress it to nothing
pub fn textured(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.max(1);
    RgbImage::from_fn(width, height, |x, y| {
        let base_r = (x * 255 / width.max(1)) as i32;
        let base_g = (y * 255 / height.max(1)) as i32;
        let base_b = ((x + y) * 127 / (width + height).max(1)) as i32;
        let jitter = |base: i32, n: u8| (base + n as i32 / 4 - 32).clamp(0, 255) as u8;
        image::Rgb([
            jitter(base_r, noise(&mut state)),
            jitter(base_g, noise(&mut state)),
            jitter(base_b, noise(&mut state)),
        ])
    })
}

/// Smooth gradient; compresses well, decodes at full cost
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
        .unwrap();
    out
}

pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buffer, RasterFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Textured JPEG that passes default validation (size bounds and content scans)
pub fn valid_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let validator = Validator::default();
    for seed in 1..64 {
        let data = encode_jpeg(&textured(width, height, seed), quality);
        if validator
            .validate(&data, "photo.jpg", "image/jpeg", data.len())
            .is_ok()
        {
            return data;
        }
    }
    panic!("no textured {}x{} JPEG passed validation", width, height);
}

/// High-quality 1600x1200 photo-like JPEG in the low megabytes
pub fn large_recipe_photo() -> Vec<u8> {
    let validator = Validator::default();
    for quality in [92, 85, 75, 60] {
        for seed in 1..16 {
            let data = encode_jpeg(&textured(1600, 1200, seed), quality);
            if validator
                .validate(&data, "dinner.jpg", "image/jpeg", data.len())
                .is_ok()
            {
                return data;
            }
        }
    }
    panic!("could not build a large recipe photo within the size limit");
}

/// JPEG header followed by bytes no decoder accepts
pub fn undecodable_jpeg() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(4096, 0x42);
    data
}

pub fn uploads(dir: &Path) -> PathBuf {
    dir.join("uploads")
}
