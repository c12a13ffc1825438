//! High-level image operations: normalize and fit.
//!
//! These functions combine the pure geometry in
//! [`calculations`](super::calculations) with backend execution. They never
//! touch the filesystem: bytes in, bytes out.
//!
//! ## Normalize
//!
//! Flatten to opaque RGB, pick a crop region (caller's rectangle, clamped,
//! or the centered smart-fill region), crop, then resample to exactly the
//! target size.
//!
//! ## Fit
//!
//! A fixed greedy ladder, each tier tried only when the previous encoding
//! is over budget:
//!
//! | Tier | Action |
//! |---|---|
//! | Baseline | lossless PNG at full size |
//! | Palette | median cut to 256 colors, becomes the working base |
//! | Downscale | working base at 95%, 90%, … 50% of the target |
//! | Aggressive | smallest downscale quantized to 128, 64, 32 colors |
//!
//! First encoding at or under budget wins. If none fits, the last one is
//! returned flagged `degraded`; a missed budget is not an error.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    AGGRESSIVE_COLORS, PALETTE_COLORS, clamp_crop, downscale_percents, scaled_dimensions,
    smart_fill_region,
};
use super::flatten::{ColorMode, flatten_to_rgb};
use super::params::{CropRect, Region, TargetSpec};
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::fmt;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// An opaque RGB image exactly the size of its [`TargetSpec`].
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    image: RgbImage,
}

impl NormalizedImage {
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Summary of a decoded image, without any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
}

/// Which rung of the ladder produced an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum FitTier {
    Baseline,
    Palette,
    Downscale { percent: u32 },
    Aggressive { colors: u16 },
}

impl FitTier {
    /// Any tier past the baseline loses information.
    pub fn is_lossy(self) -> bool {
        !matches!(self, Self::Baseline)
    }
}

impl fmt::Display for FitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Palette => write!(f, "palette {PALETTE_COLORS}"),
            Self::Downscale { percent } => write!(f, "downscale {percent}%"),
            Self::Aggressive { colors } => write!(f, "palette {colors}"),
        }
    }
}

/// One encoding the ladder tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FitAttempt {
    #[serde(flatten)]
    pub tier: FitTier,
    pub width: u32,
    pub height: u32,
    pub encoded_size: u64,
}

/// Final encoding for one image.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub bytes: Vec<u8>,
    pub encoded_size: u64,
    /// A lossy fallback (quantization or downscale) was applied.
    pub degraded: bool,
    /// `encoded_size <= max_bytes`. False only when the ladder ran out.
    pub within_budget: bool,
    pub width: u32,
    pub height: u32,
    pub tier: FitTier,
    /// Every encoding tried, in order; the last one is this result.
    pub attempts: Vec<FitAttempt>,
}

/// Decode raw bytes and reject degenerate geometry.
pub fn decode(backend: &impl ImageBackend, bytes: &[u8]) -> Result<DynamicImage> {
    let image = backend.decode(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(BackendError::InvalidGeometry {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}

/// Decode and describe an image without normalizing it.
pub fn inspect(backend: &impl ImageBackend, bytes: &[u8]) -> Result<ImageInfo> {
    let image = decode(backend, bytes)?;
    Ok(ImageInfo {
        width: image.width(),
        height: image.height(),
        mode: ColorMode::of(&image),
    })
}

/// Pick the source region: the caller's crop if given, else smart-fill.
pub fn plan_region(
    source: (u32, u32),
    crop: Option<&CropRect>,
    target: &TargetSpec,
) -> Result<Region> {
    let (width, height) = source;
    if width == 0 || height == 0 {
        return Err(BackendError::InvalidGeometry { width, height });
    }
    match crop {
        Some(crop) => {
            let region = clamp_crop(source, crop);
            if region.is_empty() {
                return Err(BackendError::EmptyCrop { width, height });
            }
            Ok(region)
        }
        None => {
            let region = smart_fill_region(source, target.dimensions());
            if region.is_empty() {
                return Err(BackendError::InvalidGeometry { width, height });
            }
            Ok(region)
        }
    }
}

/// Convert any decoded image into an opaque, exactly target-sized square.
pub fn normalize(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    crop: Option<&CropRect>,
    target: &TargetSpec,
) -> Result<NormalizedImage> {
    if target.width == 0 || target.height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "Target size {}x{} is empty",
            target.width, target.height
        )));
    }

    let source = (image.width(), image.height());
    let region = plan_region(source, crop, target)?;
    let flat = flatten_to_rgb(image);

    let cropped = if (region.width(), region.height()) == source {
        flat
    } else {
        image::imageops::crop_imm(
            &flat,
            region.left,
            region.top,
            region.width(),
            region.height(),
        )
        .to_image()
    };

    let resized = backend.resize(&cropped, target.width, target.height)?;
    if resized.dimensions() != target.dimensions() {
        return Err(BackendError::ProcessingFailed(format!(
            "Resize produced {}x{}, expected {}x{}",
            resized.width(),
            resized.height(),
            target.width,
            target.height
        )));
    }
    Ok(NormalizedImage { image: resized })
}

/// Tracks encodings tried by [`fit`], keeping only the latest bytes.
struct Ladder<'a, B: ImageBackend> {
    backend: &'a B,
    max_bytes: u64,
    attempts: Vec<FitAttempt>,
    last: Vec<u8>,
}

impl<'a, B: ImageBackend> Ladder<'a, B> {
    fn new(backend: &'a B, max_bytes: u64) -> Self {
        Self {
            backend,
            max_bytes,
            attempts: Vec::new(),
            last: Vec::new(),
        }
    }

    /// Encode `image` and report whether it fits the budget.
    fn attempt(&mut self, image: &RgbImage, tier: FitTier) -> Result<bool> {
        let bytes = self.backend.encode(image)?;
        let encoded_size = bytes.len() as u64;
        let fits = encoded_size <= self.max_bytes;
        log::debug!(
            "{}: {}x{} → {} bytes (budget {}, {})",
            tier,
            image.width(),
            image.height(),
            encoded_size,
            self.max_bytes,
            if fits { "fits" } else { "over" }
        );
        self.attempts.push(FitAttempt {
            tier,
            width: image.width(),
            height: image.height(),
            encoded_size,
        });
        self.last = bytes;
        Ok(fits)
    }

    fn finish(self) -> Result<FitResult> {
        let Some(&last) = self.attempts.last() else {
            return Err(BackendError::ProcessingFailed(
                "No encoding was attempted".to_string(),
            ));
        };
        Ok(FitResult {
            bytes: self.last,
            encoded_size: last.encoded_size,
            degraded: last.tier.is_lossy(),
            within_budget: last.encoded_size <= self.max_bytes,
            width: last.width,
            height: last.height,
            tier: last.tier,
            attempts: self.attempts,
        })
    }
}

/// Re-encode and degrade `image` until it fits `target.max_bytes`.
///
/// See the [module docs](self) for the ladder.
pub fn fit(
    backend: &impl ImageBackend,
    image: &NormalizedImage,
    target: &TargetSpec,
) -> Result<FitResult> {
    let mut ladder = Ladder::new(backend, target.max_bytes);

    if ladder.attempt(image.as_rgb(), FitTier::Baseline)? {
        return ladder.finish();
    }

    let working = backend.quantize(image.as_rgb(), PALETTE_COLORS)?;
    if ladder.attempt(&working, FitTier::Palette)? {
        return ladder.finish();
    }

    let mut smallest: Option<RgbImage> = None;
    for percent in downscale_percents() {
        let (width, height) = scaled_dimensions(target.dimensions(), percent);
        let resized = backend.resize(&working, width, height)?;
        if ladder.attempt(&resized, FitTier::Downscale { percent })? {
            return ladder.finish();
        }
        smallest = Some(resized);
    }

    let base = smallest.as_ref().unwrap_or(&working);
    for colors in AGGRESSIVE_COLORS {
        let quantized = backend.quantize(base, colors)?;
        if ladder.attempt(&quantized, FitTier::Aggressive { colors })? {
            return ladder.finish();
        }
    }

    ladder.finish()
}

/// Full per-image pipeline: decode, normalize, fit.
pub fn normalize_and_fit(
    backend: &impl ImageBackend,
    bytes: &[u8],
    crop: Option<&CropRect>,
    target: &TargetSpec,
) -> Result<FitResult> {
    let image = decode(backend, bytes)?;
    let normalized = normalize(backend, &image, crop, target)?;
    fit(backend, &normalized, target)
}
