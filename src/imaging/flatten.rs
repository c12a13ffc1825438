//! Color-mode classification and opacity flattening.
//!
//! Everything downstream of decoding works on opaque 8-bit RGB: the PNG
//! encoder is always fed three channels and quantization ignores alpha.
//! Translucent pixels are composited onto white, matching what a viewer
//! shows for a transparent image on a light page.

use image::{ColorType, DynamicImage, Rgb, RgbImage};
use serde::Serialize;
use std::fmt;

/// Background used when compositing away transparency.
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Color layout of a decoded image, as far as flattening is concerned.
///
/// `Palette` never comes out of the `image` crate's decoders (indexed PNGs
/// and GIFs are expanded to RGB/RGBA on decode); it exists so callers that
/// decode elsewhere can still describe their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    TruecolorAlpha,
    Truecolor,
    GrayscaleAlpha,
    Palette,
    Grayscale,
    Other,
}

impl ColorMode {
    pub fn of(image: &DynamicImage) -> Self {
        match image.color() {
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => Self::TruecolorAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => Self::Truecolor,
            ColorType::La8 | ColorType::La16 => Self::GrayscaleAlpha,
            ColorType::L8 | ColorType::L16 => Self::Grayscale,
            _ => Self::Other,
        }
    }

    /// Whether flattening must composite against [`BACKGROUND`].
    pub fn needs_compositing(self) -> bool {
        matches!(
            self,
            Self::TruecolorAlpha | Self::GrayscaleAlpha | Self::Palette
        )
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TruecolorAlpha => "RGBA",
            Self::Truecolor => "RGB",
            Self::GrayscaleAlpha => "LA",
            Self::Palette => "P",
            Self::Grayscale => "L",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Convert any decoded image to opaque 8-bit RGB.
///
/// Alpha-carrying modes are alpha-blended over white; everything else is a
/// plain channel conversion.
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !ColorMode::of(image).needs_compositing() && !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let [bg_r, bg_g, bg_b] = BACKGROUND.0;
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8, bg: u8| -> u8 {
            let a = a as u32;
            ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
        };
        Rgb([blend(r, bg_r), blend(g, bg_g), blend(b, bg_b)])
    })
}
