//! Resize geometry
//!
//! Both fit modes refuse to upscale: the output is never larger than the
//! source (or, for `Cover`, than the centred crop of the source).

use super::profile::FitMode;

/// Region of the source to keep before scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Crop (optional) followed by a scale to `width` x `height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub crop: Option<CropRect>,
    pub width: u32,
    pub height: u32,
}

impl ResizePlan {
    /// True when the plan leaves a `src_w` x `src_h` image untouched
    pub fn is_identity(&self, src_w: u32, src_h: u32) -> bool {
        self.crop.is_none() && self.width == src_w && self.height == src_h
    }
}

/// Work out how to bring a `src_w` x `src_h` image into the target box.
pub fn plan_resize(
    src_w: u32,
    src_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
    fit: FitMode,
) -> ResizePlan {
    match (fit, target_w, target_h) {
        (FitMode::Cover, Some(w), Some(h)) => plan_cover(src_w, src_h, w, h),
        _ => {
            let (width, height) = contain_dimensions(src_w, src_h, target_w, target_h);
            ResizePlan {
                crop: None,
                width,
                height,
            }
        }
    }
}

/// Largest size that fits the box while keeping aspect ratio, capped at 1:1
pub fn contain_dimensions(
    src_w: u32,
    src_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
) -> (u32, u32) {
    let scale_w = target_w.map(|w| w as f64 / src_w as f64);
    let scale_h = target_h.map(|h| h as f64 / src_h as f64);

    let scale = match (scale_w, scale_h) {
        (Some(sw), Some(sh)) => sw.min(sh),
        (Some(sw), None) => sw,
        (None, Some(sh)) => sh,
        (None, None) => return (src_w, src_h),
    }
    .min(1.0);

    apply_scale(src_w, src_h, scale)
}

fn plan_cover(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> ResizePlan {
    let target_aspect = target_w as f64 / target_h as f64;
    let src_aspect = src_w as f64 / src_h as f64;

    let (crop_w, crop_h) = if src_aspect > target_aspect {
        // too wide: trim the sides
        let w = (src_h as f64 * target_aspect).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // too tall: trim top and bottom
        let h = (src_w as f64 / target_aspect).round() as u32;
        (src_w, h.clamp(1, src_h))
    };

    let crop = if crop_w == src_w && crop_h == src_h {
        None
    } else {
        Some(CropRect {
            x: (src_w - crop_w) / 2,
            y: (src_h - crop_h) / 2,
            width: crop_w,
            height: crop_h,
        })
    };

    let scale = (target_w as f64 / crop_w as f64).min(1.0);
    let (width, height) = apply_scale(crop_w, crop_h, scale);

    ResizePlan {
        crop,
        width: width.min(target_w),
        height: height.min(target_h),
    }
}

fn apply_scale(src_w: u32, src_h: u32, scale: f64) -> (u32, u32) {
    let w = (src_w as f64 * scale).round() as u32;
    let h = (src_h as f64 * scale).round() as u32;
    (w.max(1), h.max(1))
}
