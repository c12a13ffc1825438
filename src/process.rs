//! Batch orchestration: many inputs in, one report out.
//!
//! Each input image runs the full decode → normalize → fit pipeline on its
//! own. Images are processed in parallel using [rayon](https://docs.rs/rayon);
//! a failure in one image is recorded as a [`FileError`] and never aborts
//! its siblings.
//!
//! ## Flow
//!
//! ```text
//! inputs ──par_iter──▶ extension check ─▶ normalize_and_fit ─▶ ProcessedImage
//!                              │                  │
//!                              └──── FileError ◀──┘
//!
//! successes ─▶ archive (deflate ZIP, omitted when empty)
//! ```
//!
//! Results keep input order, and output names are unique within a batch
//! (`photo.jpg` and `photo.png` yield `photo_1080x1080.png` and
//! `photo_1080x1080_1.png`). Progress is reported through an optional
//! [`ProcessEvent`] channel so the CLI can print while workers run.
//!
//! The batch itself never touches the filesystem; [`collect_inputs`],
//! [`load_inputs`] and [`load_crops`] are the thin I/O edge used by the CLI.
//! Files that cannot be read become [`FileError`]s too, merged into the
//! report with [`BatchReport::with_load_errors`].

use crate::archive::{ArchiveEntry, build_archive};
use crate::config::{FitConfig, OutputConfig};
use crate::imaging::{
    BackendError, CropRect, FitTier, ImageBackend, ImageInfo, RustBackend, inspect,
    normalize_and_fit,
};
use crate::naming::{deduplicate, has_allowed_extension, output_name, secure_filename};
use base64::{Engine as _, engine::general_purpose};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("File type not allowed: {0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Imaging(#[from] BackendError),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// One uploaded image: its client-side name, raw bytes, and optional crop.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub name: String,
    pub bytes: Vec<u8>,
    pub crop: Option<CropRect>,
}

impl InputImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            crop: None,
        }
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// A successfully normalized and fitted image.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Sanitized input name.
    pub original_name: String,
    /// `<stem>_<w>x<h>.png`
    pub processed_name: String,
    /// Encoded PNG.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub tier: FitTier,
    pub degraded: bool,
    pub within_budget: bool,
    /// Number of encodings the ladder tried.
    pub attempts: usize,
}

impl ProcessedImage {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A per-image failure. `filename` is the name as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub filename: String,
    pub error: String,
}

/// Progress events emitted while a batch runs.
///
/// Indices are 1-based positions in the input batch. Events arrive in
/// completion order, which may differ from input order.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        image_count: usize,
    },
    ImageProcessed {
        index: usize,
        original_name: String,
        processed_name: String,
        size: u64,
        tier: FitTier,
        degraded: bool,
        within_budget: bool,
    },
    ImageFailed {
        index: usize,
        filename: String,
        error: String,
    },
}

/// Everything a batch produced, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessedImage>,
    pub errors: Vec<FileError>,
    /// Archive file name the bundle should be saved under.
    pub archive_name: String,
    /// Deflate ZIP of every processed image; `None` when nothing succeeded.
    pub archive: Option<Vec<u8>>,
}

impl BatchReport {
    /// Prepend failures from reading inputs, ahead of processing failures.
    pub fn with_load_errors(mut self, load_errors: Vec<FileError>) -> Self {
        self.errors.splice(0..0, load_errors);
        self
    }

    /// Wire form of this report, payloads base64-encoded.
    pub fn response(&self) -> BatchResponse {
        BatchResponse {
            success: true,
            processed: self.processed.len(),
            errors: self.errors.len(),
            files: self.processed.iter().map(FileEntry::from).collect(),
            error_details: self.errors.clone(),
            zip_data: self
                .archive
                .as_ref()
                .map(|zip| general_purpose::STANDARD.encode(zip)),
        }
    }
}

/// JSON batch response.
///
/// `success` reports that the batch ran; per-image failures are counted in
/// `errors` and listed in `error_details`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub processed: usize,
    pub errors: usize,
    pub files: Vec<FileEntry>,
    pub error_details: Vec<FileError>,
    pub zip_data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub original_name: String,
    pub processed_name: String,
    pub size: u64,
    pub size_mb: f64,
    pub degraded: bool,
    pub within_budget: bool,
    pub data: String,
}

impl From<&ProcessedImage> for FileEntry {
    fn from(image: &ProcessedImage) -> Self {
        Self {
            original_name: image.original_name.clone(),
            processed_name: image.processed_name.clone(),
            size: image.size(),
            size_mb: size_mb(image.size()),
            degraded: image.degraded,
            within_budget: image.within_budget,
            data: general_purpose::STANDARD.encode(&image.bytes),
        }
    }
}

/// Bytes as MiB, rounded to two decimals.
pub fn size_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Process a batch with the production backend.
pub fn process_batch(
    inputs: &[InputImage],
    config: &FitConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    process_batch_with_backend(&RustBackend::new(), inputs, config, events)
}

/// Process a batch using a specific backend (allows testing with mock).
///
/// Per-image failures land in [`BatchReport::errors`]; only archive
/// construction can fail the whole batch.
pub fn process_batch_with_backend(
    backend: &impl ImageBackend,
    inputs: &[InputImage],
    config: &FitConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    if let Some(tx) = &events {
        tx.send(ProcessEvent::BatchStarted {
            image_count: inputs.len(),
        })
        .ok();
    }

    let target = config.target.spec();
    let names = deduplicate(
        inputs
            .iter()
            .map(|input| output_name(&input.name, target.width, target.height))
            .collect(),
    );

    let outcomes: Vec<Result<ProcessedImage, FileError>> = inputs
        .par_iter()
        .zip(names.into_par_iter())
        .enumerate()
        .map(|(i, (input, name))| {
            let outcome = process_named(backend, input, config, name).map_err(|e| FileError {
                filename: input.name.clone(),
                error: e.to_string(),
            });
            report(events.as_ref(), i + 1, &outcome);
            outcome
        })
        .collect();

    let mut processed = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(image) => processed.push(image),
            Err(error) => errors.push(error),
        }
    }

    let entries: Vec<ArchiveEntry<'_>> = processed
        .iter()
        .map(|image| ArchiveEntry {
            name: &image.processed_name,
            bytes: &image.bytes,
        })
        .collect();
    let archive = build_archive(&entries)?;

    log::info!(
        "Batch done: {} processed, {} failed",
        processed.len(),
        errors.len()
    );

    Ok(BatchReport {
        processed,
        errors,
        archive_name: config.output.archive_name.clone(),
        archive,
    })
}

/// Run one input through the pipeline.
pub fn process_image(
    backend: &impl ImageBackend,
    input: &InputImage,
    config: &FitConfig,
) -> Result<ProcessedImage, ProcessError> {
    let target = config.target.spec();
    let name = output_name(&input.name, target.width, target.height);
    process_named(backend, input, config, name)
}

fn process_named(
    backend: &impl ImageBackend,
    input: &InputImage,
    config: &FitConfig,
    processed_name: String,
) -> Result<ProcessedImage, ProcessError> {
    if !config.output.is_allowed(&input.name) {
        return Err(ProcessError::UnsupportedFormat(input.name.clone()));
    }

    let target = config.target.spec();
    let result = normalize_and_fit(backend, &input.bytes, input.crop.as_ref(), &target)?;

    Ok(ProcessedImage {
        original_name: secure_filename(&input.name),
        processed_name,
        width: result.width,
        height: result.height,
        tier: result.tier,
        degraded: result.degraded,
        within_budget: result.within_budget,
        attempts: result.attempts.len(),
        bytes: result.bytes,
    })
}

fn report(
    events: Option<&Sender<ProcessEvent>>,
    index: usize,
    outcome: &Result<ProcessedImage, FileError>,
) {
    match outcome {
        Ok(image) => {
            log::info!(
                "{} → {} ({} bytes, {})",
                image.original_name,
                image.processed_name,
                image.size(),
                image.tier
            );
            if !image.within_budget {
                log::warn!(
                    "{} is still over budget after every tier ({} bytes)",
                    image.processed_name,
                    image.size()
                );
            }
        }
        Err(error) => log::warn!("{}: {}", error.filename, error.error),
    }

    let Some(tx) = events else { return };
    let event = match outcome {
        Ok(image) => ProcessEvent::ImageProcessed {
            index,
            original_name: image.original_name.clone(),
            processed_name: image.processed_name.clone(),
            size: image.size(),
            tier: image.tier,
            degraded: image.degraded,
            within_budget: image.within_budget,
        },
        Err(error) => ProcessEvent::ImageFailed {
            index,
            filename: error.filename.clone(),
            error: error.error.clone(),
        },
    };
    tx.send(event).ok();
}

// =============================================================================
// Check: decode and describe without encoding
// =============================================================================

/// Outcome of inspecting one input.
#[derive(Debug, Clone)]
pub struct CheckEntry {
    pub filename: String,
    pub result: Result<ImageInfo, String>,
}

impl From<FileError> for CheckEntry {
    fn from(error: FileError) -> Self {
        Self {
            filename: error.filename,
            result: Err(error.error),
        }
    }
}

/// Decode every input and report its size and color mode.
pub fn check_inputs(
    backend: &impl ImageBackend,
    inputs: &[InputImage],
    output: &OutputConfig,
) -> Vec<CheckEntry> {
    inputs
        .par_iter()
        .map(|input| {
            let result = if output.is_allowed(&input.name) {
                inspect(backend, &input.bytes).map_err(|e| e.to_string())
            } else {
                Err(ProcessError::UnsupportedFormat(input.name.clone()).to_string())
            };
            CheckEntry {
                filename: input.name.clone(),
                result,
            }
        })
        .collect()
}

// =============================================================================
// Filesystem edge
// =============================================================================

/// Expand `paths` into the list of files to process.
///
/// Files are kept as given, even with a disallowed extension, so the batch
/// can report them. Directories are walked recursively and contribute only
/// files with an allowed extension, sorted by path.
pub fn collect_inputs(
    paths: &[PathBuf],
    output: &OutputConfig,
) -> Result<Vec<PathBuf>, ProcessError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file()
                    && has_allowed_extension(
                        &entry.file_name().to_string_lossy(),
                        &output.allowed_extensions,
                    )
                {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Read crop rectangles from a JSON object keyed by input file name.
///
/// ```json
/// { "beach.jpg": { "x": 100, "y": 50, "width": 400, "height": 400 } }
/// ```
pub fn load_crops(path: &Path) -> Result<HashMap<String, CropRect>, ProcessError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read each file into an [`InputImage`], attaching its crop by file name.
///
/// A file that cannot be read is returned as a [`FileError`] instead, so
/// one bad path never stops the rest from loading.
pub fn load_inputs(
    files: &[PathBuf],
    crops: &HashMap<String, CropRect>,
) -> (Vec<InputImage>, Vec<FileError>) {
    let mut images = Vec::with_capacity(files.len());
    let mut errors = Vec::new();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        match std::fs::read(path) {
            Ok(bytes) => {
                let crop = crops.get(&name).copied();
                images.push(InputImage { name, bytes, crop });
            }
            Err(e) => {
                let error = ProcessError::from(e).to_string();
                log::warn!("{}: {}", path.display(), error);
                errors.push(FileError {
                    filename: name,
                    error,
                });
            }
        }
    }
    (images, errors)
}
