//! Shared test utilities for the squarefit test suite.
//!
//! Synthetic image builders and in-memory encoders, so tests never depend
//! on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = encode_as(&DynamicImage::ImageRgb8(gradient(64, 32)), ImageFormat::Png);
//! let flat = solid(1080, 1080, [255, 0, 0]);
//! let busy = noise(128, 128, 7);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

// =========================================================================
// Builders
// =========================================================================

/// Single-color RGB image.
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Smooth horizontal/vertical gradient. Many distinct colors, compresses well.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) % 256) as u8;
        Rgb([r, g, b])
    })
}

/// Deterministic pseudo-random noise (xorshift32). Close to incompressible.
pub fn noise(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    RgbImage::from_fn(width, height, |_, _| {
        let v = next().to_le_bytes();
        Rgb([v[0], v[1], v[2]])
    })
}

// =========================================================================
// Encoding
// =========================================================================

/// Encode `image` in `format` into a byte buffer.
pub fn encode_as(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}

/// PNG bytes of `image`.
pub fn png_bytes(image: RgbImage) -> Vec<u8> {
    encode_as(&DynamicImage::ImageRgb8(image), ImageFormat::Png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic_per_seed() {
        assert_eq!(noise(8, 8, 3), noise(8, 8, 3));
        assert_ne!(noise(8, 8, 3), noise(8, 8, 4));
    }

    #[test]
    fn gradient_has_many_colors() {
        assert!(crate::imaging::quantize::count_colors(&gradient(64, 64)) > 256);
    }

    #[test]
    fn png_bytes_round_trip_dimensions() {
        let img = image::load_from_memory(&png_bytes(solid(5, 3, [1, 2, 3]))).unwrap();
        assert_eq!((img.width(), img.height()), (5, 3));
    }
}
