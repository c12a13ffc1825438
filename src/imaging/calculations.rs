//! Pure calculation functions for crop geometry and the downscale ladder.
//!
//! All functions here are pure and testable without any I/O or images.
//! Geometry is done in integer arithmetic: a ratio like `1080 / 1.08` is not
//! exact in floating point and would truncate one pixel short.

use super::params::{CropRect, Region};

/// Colors kept by the first (gentle) quantization tier.
pub const PALETTE_COLORS: u16 = 256;

/// Color counts tried, in order, once downscaling is exhausted.
pub const AGGRESSIVE_COLORS: [u16; 3] = [128, 64, 32];

/// Downscale factors in percent, largest first: 95, 90, … 50.
const DOWNSCALE_START: u32 = 95;
const DOWNSCALE_STEP: u32 = 5;
const DOWNSCALE_FLOOR: u32 = 50;

/// Clamp a caller-supplied crop rectangle to the source bounds.
///
/// Fractional coordinates truncate toward zero, negative origins clamp to 0,
/// and the far edges clamp to the image size. The result may be empty when
/// the rectangle lies entirely outside the image.
///
/// # Examples
/// ```
/// # use squarefit::imaging::{CropRect, clamp_crop};
/// let crop = CropRect { x: 100.0, y: 50.0, width: 400.0, height: 400.0 };
/// let r = clamp_crop((800, 600), &crop);
/// assert_eq!((r.left, r.top, r.right, r.bottom), (100, 50, 500, 450));
/// ```
pub fn clamp_crop(source: (u32, u32), crop: &CropRect) -> Region {
    let (src_w, src_h) = source;

    // `as u32` saturates: negatives and NaN become 0, overflow becomes u32::MAX.
    let left = crop.x.max(0.0) as u32;
    let top = crop.y.max(0.0) as u32;
    let right = ((crop.x + crop.width).max(0.0) as u32).min(src_w);
    let bottom = ((crop.y + crop.height).max(0.0) as u32).min(src_h);

    Region {
        left: left.min(src_w),
        top: top.min(src_h),
        right,
        bottom,
    }
}

/// Compute the centered crop region that fills a target without padding.
///
/// Orientation decides which scale is tried first:
///
/// - **Landscape** (`width >= height`): scale so the height matches the
///   target. If the scaled width covers the target, crop width only
///   (full height, horizontally centered). Otherwise keep the full width
///   and crop height, vertically centered.
/// - **Portrait**: the same rule with width and height swapped.
///
/// The region always has the target's aspect ratio (up to truncation) and
/// is clamped to the source bounds.
///
/// # Examples
/// ```
/// # use squarefit::imaging::smart_fill_region;
/// // 2000x1000 into 1080x1080: keep 1000px of width, centered
/// let r = smart_fill_region((2000, 1000), (1080, 1080));
/// assert_eq!((r.left, r.top, r.right, r.bottom), (500, 0, 1500, 1000));
/// ```
pub fn smart_fill_region(source: (u32, u32), target: (u32, u32)) -> Region {
    let (src_w, src_h) = (source.0 as u64, source.1 as u64);
    let (tgt_w, tgt_h) = (target.0 as u64, target.1 as u64);

    if src_w == 0 || src_h == 0 || tgt_w == 0 || tgt_h == 0 {
        return Region {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
    }

    let (crop_w, crop_h) = if src_w >= src_h {
        // scale = tgt_h / src_h; scaled width covers when src_w * scale >= tgt_w
        if src_w * tgt_h >= tgt_w * src_h {
            (tgt_w * src_h / tgt_h, src_h)
        } else {
            (src_w, tgt_h * src_w / tgt_w)
        }
    } else if src_h * tgt_w >= tgt_h * src_w {
        // scale = tgt_w / src_w
        (src_w, tgt_h * src_w / tgt_w)
    } else {
        (tgt_w * src_h / tgt_h, src_h)
    };

    let crop_w = crop_w.clamp(1, src_w);
    let crop_h = crop_h.clamp(1, src_h);
    let left = (src_w - crop_w) / 2;
    let top = (src_h - crop_h) / 2;

    Region {
        left: left as u32,
        top: top as u32,
        right: (left + crop_w).min(src_w) as u32,
        bottom: (top + crop_h).min(src_h) as u32,
    }
}

/// Downscale factors (percent of the target size), largest first.
///
/// Finite by construction: `95, 90, … 55, 50`.
pub fn downscale_percents() -> impl Iterator<Item = u32> {
    (DOWNSCALE_FLOOR..=DOWNSCALE_START)
        .rev()
        .step_by(DOWNSCALE_STEP as usize)
}

/// Output dimensions for one downscale step: `trunc(target * percent / 100)`.
///
/// Never returns a zero side.
pub fn scaled_dimensions(target: (u32, u32), percent: u32) -> (u32, u32) {
    let scale = |side: u32| ((side as u64 * percent as u64 / 100) as u32).max(1);
    (scale(target.0), scale(target.1))
}
