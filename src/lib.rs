//! # squarefit
//!
//! Normalizes arbitrary images into fixed-size squares that fit a byte
//! ceiling. Every output is an opaque RGB PNG of exactly the target size
//! (1080×1080 by default) and, whenever any degradation step allows, no
//! larger than the budget (5 MiB by default).
//!
//! # Architecture: Normalize, Then Fit
//!
//! Each image goes through two independent stages:
//!
//! ```text
//! 1. Normalize   bytes → opaque RGB, cropped and resampled to the target
//! 2. Fit         RGB   → PNG bytes, degrading until they fit the budget
//! ```
//!
//! Normalize never looks at the budget and fit never changes the framing, so
//! crop geometry and the degradation ladder can be tested separately. Both
//! are pure: bytes in, bytes out, no filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pure-Rust image operations: decode, flatten, crop/smart-fill, resize, quantize, PNG fit ladder |
//! | [`process`] | Parallel batch orchestration, per-image error isolation, JSON response |
//! | [`archive`] | In-memory deflate ZIP of processed images |
//! | [`config`] | `squarefit.toml` loading, validation, and merging over stock defaults |
//! | [`naming`] | Filename sanitization and `<stem>_<w>x<h>.png` output naming |
//! | [`output`] | CLI output formatting for fit progress, summaries, and checks |
//!
//! # Design Decisions
//!
//! ## Smart Fill Instead of Letterboxing
//!
//! Without an explicit crop the image is scaled to cover the target and the
//! overhang is cropped symmetrically. Output never carries bars; the cost is
//! losing edges of strongly non-square sources.
//!
//! ## PNG Only
//!
//! Output is always PNG so the baseline attempt is lossless. Size reduction
//! comes from palette quantization and downscaling, in that order, so the
//! first acceptable encoding is also the least degraded one the ladder
//! knows how to make.
//!
//! ## Budget Misses Are Not Errors
//!
//! An image that fails to fit after every tier is still returned, flagged
//! `degraded` and `within_budget = false`. Only undecodable or unsupported
//! inputs produce per-image errors.

pub mod archive;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
