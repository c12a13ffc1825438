//! Configuration module.
//!
//! Handles loading, validating, and merging `squarefit.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [target]
//! width = 1080              # Output width in pixels
//! height = 1080             # Output height in pixels
//! max_bytes = 5242880       # Byte ceiling per output image (5 MiB)
//!
//! [output]
//! archive_name = "resized_images.zip"
//! allowed_extensions = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif", "heic", "heif"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! # Smaller thumbnails under a 1 MiB ceiling
//! [target]
//! width = 512
//! height = 512
//! max_bytes = 1048576
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::TargetSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "squarefit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `squarefit.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Output geometry and byte budget.
    pub target: TargetConfig,
    /// Output naming, archive and accepted inputs.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl FitConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.width == 0 || self.target.height == 0 {
            return Err(ConfigError::Validation(
                "target.width and target.height must be non-zero".into(),
            ));
        }
        if self.target.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "target.max_bytes must be non-zero".into(),
            ));
        }
        if !self.output.archive_name.ends_with(".zip") || self.output.archive_name.len() <= 4 {
            return Err(ConfigError::Validation(
                "output.archive_name must be a non-empty name ending in .zip".into(),
            ));
        }
        if self.output.allowed_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "output.allowed_extensions must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output geometry and byte budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Byte ceiling per encoded image.
    pub max_bytes: u64,
}

impl TargetConfig {
    pub fn spec(&self) -> TargetSpec {
        TargetSpec::new(self.width, self.height, self.max_bytes)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        let spec = TargetSpec::default();
        Self {
            width: spec.width,
            height: spec.height,
            max_bytes: spec.max_bytes,
        }
    }
}

/// Output naming and accepted inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File name of the archive bundling every processed image.
    pub archive_name: String,
    /// Input extensions accepted for processing (case-insensitive).
    pub allowed_extensions: Vec<String>,
}

impl OutputConfig {
    /// Whether `filename` carries an accepted extension.
    pub fn is_allowed(&self, filename: &str) -> bool {
        crate::naming::has_allowed_extension(filename, &self.allowed_extensions)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_name: "resized_images.zip".to_string(),
            allowed_extensions: [
                "png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif", "heic", "heif",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(FitConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<FitConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FitConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Returns stock defaults when the file does not exist. Returns `Err` if it
/// exists but is invalid TOML, has unknown keys, or fails validation.
pub fn load_config(path: &Path) -> Result<FitConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `squarefit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# squarefit configuration
# ======================
# All options are optional. Uncomment and change only what you need;
# everything else keeps the default shown here.

[target]
# Every output image is exactly width x height pixels.
width = 1080
height = 1080
# Byte ceiling per output image. Images that do not fit losslessly are
# quantized, then downscaled (95% down to 50%), then quantized harder.
# If nothing fits, the smallest attempt is kept and flagged as degraded.
max_bytes = 5242880

[output]
# Name of the archive holding every processed image.
archive_name = "resized_images.zip"
# Input extensions accepted for processing (case-insensitive).
allowed_extensions = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif", "heic", "heif"]

[processing]
# Maximum parallel workers. Omit to use every CPU core.
# max_processes = 4
"##
}
