//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what to crop, resize and re-encode) and the
//! [`backend`](super::backend) (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`TargetSpec`]: Output square size and the byte budget.
//! - [`CropRect`]: Caller-supplied crop rectangle in source pixels.
//! - [`Region`]: Integer crop bounds after clamping to the source.

use serde::{Deserialize, Serialize};

/// Output geometry and byte budget for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub max_bytes: u64,
}

impl TargetSpec {
    pub fn new(width: u32, height: u32, max_bytes: u64) -> Self {
        Self {
            width,
            height,
            max_bytes,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1080,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Crop rectangle as sent by a client, in source-pixel space.
///
/// Values may be fractional (browser croppers report sub-pixel positions).
/// They are truncated and clamped to the source bounds before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel bounds `[left, right) × [top, bottom)` inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}
