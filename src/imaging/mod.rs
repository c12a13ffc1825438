//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` (format sniffed from content) |
//! | **Flatten** | alpha-blend over white → opaque RGB |
//! | **Normalize** | clamp crop or smart-fill region, Lanczos3 to the target square |
//! | **Fit** | PNG → 256-color palette → downscale → 128/64/32 colors |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry and ladder steps (unit testable)
//! - **Parameters**: Data structures describing the target and crop
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`normalize`] and [`fit`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod flatten;
pub mod operations;
mod params;
pub mod quantize;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{clamp_crop, downscale_percents, scaled_dimensions, smart_fill_region};
pub use flatten::{ColorMode, flatten_to_rgb};
pub use operations::{
    FitAttempt, FitResult, FitTier, ImageInfo, NormalizedImage, decode, fit, inspect, normalize,
    normalize_and_fit, plan_region,
};
pub use params::{CropRect, Region, TargetSpec};
pub use rust_backend::RustBackend;
