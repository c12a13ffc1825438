//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, BMP, TIFF, WebP) | `image::load_from_memory` (format sniffed from content) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Quantize | median cut, see [`quantize`](super::quantize) |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, best compression, adaptive filtering |

use super::backend::{BackendError, ImageBackend};
use super::quantize;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(
        &self,
        image: &RgbImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, BackendError> {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot resize {}x{} to {}x{}",
                image.width(),
                image.height(),
                width,
                height
            )));
        }
        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }
        Ok(image::imageops::resize(
            image,
            width,
            height,
            FilterType::Lanczos3,
        ))
    }

    fn quantize(&self, image: &RgbImage, colors: u16) -> Result<RgbImage, BackendError> {
        Ok(quantize::quantize(image, colors))
    }

    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_as, gradient};
    use image::{ImageFormat, Rgb, Rgba, RgbaImage};

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn decode_png_bytes() {
        let bytes = encode_as(&DynamicImage::ImageRgb8(gradient(40, 30)), ImageFormat::Png);
        let img = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[test]
    fn decode_sniffs_format_from_content() {
        // JPEG bytes decode the same no matter what the caller named them
        let bytes = encode_as(&DynamicImage::ImageRgb8(gradient(16, 16)), ImageFormat::Jpeg);
        let img = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (16, 16));
    }

    #[test]
    fn decode_keeps_alpha_channel() {
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 100]));
        let bytes = encode_as(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let img = RustBackend::new().decode(&bytes).unwrap();
        assert!(img.color().has_alpha());
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_truncated_png_is_decode_error() {
        let bytes = encode_as(&DynamicImage::ImageRgb8(gradient(40, 30)), ImageFormat::Png);
        let result = RustBackend::new().decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn encode_produces_png() {
        let png = RustBackend::new().encode(&gradient(20, 10)).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);

        let back = image::load_from_memory(&png).unwrap();
        assert_eq!((back.width(), back.height()), (20, 10));
    }

    #[test]
    fn encode_is_lossless() {
        let img = gradient(32, 32);
        let png = RustBackend::new().encode(&img).unwrap();
        let back = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(back, img);
    }

    #[test]
    fn flat_image_compresses_well() {
        let img = RgbImage::from_pixel(256, 256, Rgb([200, 10, 10]));
        let png = RustBackend::new().encode(&img).unwrap();
        assert!(png.len() < 2_000, "flat image encoded to {} bytes", png.len());
    }

    #[test]
    fn resize_exact_dimensions() {
        let out = RustBackend::new().resize(&gradient(300, 200), 108, 108).unwrap();
        assert_eq!(out.dimensions(), (108, 108));
    }

    #[test]
    fn resize_to_zero_errors() {
        let result = RustBackend::new().resize(&gradient(10, 10), 0, 5);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn quantize_limits_colors() {
        let out = RustBackend::new().quantize(&gradient(64, 64), 32).unwrap();
        assert!(crate::imaging::quantize::count_colors(&out) <= 32);
    }
}
