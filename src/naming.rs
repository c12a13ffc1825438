//! Filename handling for uploaded inputs and generated outputs.
//!
//! Input names arrive from users and may contain path separators, spaces or
//! non-ASCII characters. Before a name is reused for an output file or an
//! archive entry it goes through [`secure_filename`]:
//!
//! - `../../etc/passwd` → `etc_passwd`
//! - `My Holiday Photo.JPG` → `My_Holiday_Photo.JPG`
//! - `_.hidden._` → `hidden`
//! - `café.png` → `cafe.png`
//! - `日本.png` → `png`
//!
//! Output names carry the target geometry: `beach.jpg` at 1080×1080 becomes
//! `beach_1080x1080.png`. Within one batch, repeats get a counter:
//! `beach.jpg` and `beach.png` become `beach_1080x1080.png` and
//! `beach_1080x1080_1.png`.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Fallback stem when sanitization leaves nothing usable.
const FALLBACK_STEM: &str = "image";

/// Reduce a user-supplied filename to a safe, flat ASCII name.
///
/// The name is NFKD-decomposed first, so accented letters keep their ASCII
/// base. Path separators become word breaks, whitespace runs collapse to a
/// single `_`, anything outside `[A-Za-z0-9._-]` is dropped, and
/// leading/trailing dots and underscores are stripped. May return an empty
/// string.
pub fn secure_filename(name: &str) -> String {
    let decomposed: String = name.nfkd().collect();
    let spaced = decomposed.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Name of the processed output for input `original`:
/// `<sanitized stem>_<width>x<height>.png`.
pub fn output_name(original: &str, width: u32, height: u32) -> String {
    let safe = secure_filename(original);
    let stem = match safe.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => safe.as_str(),
    };
    let stem = stem.trim_end_matches(['.', '_']);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    format!("{stem}_{width}x{height}.png")
}

/// Make every name in a batch unique, keeping order.
///
/// The first occurrence keeps its name; later repeats get `_1`, `_2`, …
/// inserted before the extension.
pub fn deduplicate(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            if taken.insert(name.clone()) {
                return name;
            }
            let (stem, ext) = match name.rsplit_once('.') {
                Some((stem, ext)) => (stem, format!(".{ext}")),
                None => (name.as_str(), String::new()),
            };
            let mut n = 1;
            loop {
                let candidate = format!("{stem}_{n}{ext}");
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

/// Whether `filename` ends in one of `allowed` (case-insensitive, no dot).
pub fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            allowed.iter().any(|a| a.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}
