//! CLI output formatting for batch runs.
//!
//! # Information-First Display
//!
//! Every image leads with its positional index and name; what happened to it
//! (output name, size, ladder tier) follows as indented context lines.
//!
//! # Output Format
//!
//! ## Fit (streamed while workers run)
//!
//! ```text
//! Fitting 3 images
//!     001 beach.jpg → beach_1080x1080.png
//!         4.12 MB, baseline
//!     003 scan.tiff → scan_1080x1080.png
//!         4.87 MB, downscale 85% (degraded)
//!     002 broken.png
//!         Error: Failed to decode image: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Processed 2, failed 1
//! Archive: output/resized_images.zip
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 beach.jpg
//!     4032x3024 RGB
//! 002 logo.png
//!     512x512 RGBA (composited onto white)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{BatchReport, CheckEntry, ProcessEvent, size_mb};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", size_mb(bytes))
}

// ============================================================================
// Fit progress
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { image_count } => match image_count {
            1 => vec!["Fitting 1 image".to_string()],
            n => vec![format!("Fitting {} images", n)],
        },
        ProcessEvent::ImageProcessed {
            index,
            original_name,
            processed_name,
            size,
            tier,
            degraded,
            within_budget,
        } => {
            let mut detail = format!("{}, {}", format_size(*size), tier);
            if !within_budget {
                detail.push_str(" (over budget)");
            } else if *degraded {
                detail.push_str(" (degraded)");
            }
            vec![
                format!(
                    "{}{} {} \u{2192} {}",
                    indent(1),
                    format_index(*index),
                    original_name,
                    processed_name
                ),
                format!("{}{}", indent(2), detail),
            ]
        }
        ProcessEvent::ImageFailed {
            index,
            filename,
            error,
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), filename),
            format!("{}Error: {}", indent(2), error),
        ],
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Format the end-of-batch summary.
///
/// `archive_path` is where the archive was written, if it was.
pub fn format_batch_summary(report: &BatchReport, archive_path: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!(
        "Processed {}, failed {}",
        report.processed.len(),
        report.errors.len()
    )];

    let over_budget: Vec<&str> = report
        .processed
        .iter()
        .filter(|p| !p.within_budget)
        .map(|p| p.processed_name.as_str())
        .collect();
    if !over_budget.is_empty() {
        lines.push(format!(
            "Over budget after every tier: {}",
            over_budget.join(", ")
        ));
    }

    if let Some(path) = archive_path {
        lines.push(format!("Archive: {}", path.display()));
    }
    lines
}

pub fn print_batch_summary(report: &BatchReport, archive_path: Option<&Path>) {
    for line in format_batch_summary(report, archive_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format `check` results: one header per input, dimensions or error beneath.
pub fn format_check_output(entries: &[CheckEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry.filename));
        match &entry.result {
            Ok(info) => {
                let note = if info.mode.needs_compositing() {
                    " (composited onto white)"
                } else {
                    ""
                };
                lines.push(format!(
                    "{}{}x{} {}{}",
                    indent(1),
                    info.width,
                    info.height,
                    info.mode,
                    note
                ));
            }
            Err(error) => lines.push(format!("{}Error: {}", indent(1), error)),
        }
    }
    lines
}

pub fn print_check_output(entries: &[CheckEntry]) {
    for line in format_check_output(entries) {
        println!("{}", line);
    }
}
