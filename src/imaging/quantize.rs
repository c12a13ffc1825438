//! Median-cut palette quantization for opaque RGB images.
//!
//! The color histogram is split recursively: the box with the widest
//! channel range is sorted along that channel and cut at the pixel-weighted
//! median, until the requested number of boxes exists or nothing can be
//! split. Each box contributes its weighted mean color to the palette, and
//! every pixel is replaced by its nearest palette entry. No dithering, so
//! the result is deterministic and compresses well.
//!
//! The output stays a full-color [`RgbImage`]; only the number of distinct
//! colors shrinks.

use image::{Rgb, RgbImage};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct ColorCount {
    rgb: [u8; 3],
    count: u32,
}

struct ColorBox {
    colors: Vec<ColorCount>,
}

impl ColorBox {
    /// Widest channel and its range.
    fn range(&self) -> (usize, u8) {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for c in &self.colors {
            for ch in 0..3 {
                min[ch] = min[ch].min(c.rgb[ch]);
                max[ch] = max[ch].max(c.rgb[ch]);
            }
        }
        (0..3)
            .map(|ch| (ch, max[ch].saturating_sub(min[ch])))
            .max_by_key(|&(ch, r)| (r, std::cmp::Reverse(ch)))
            .unwrap_or((0, 0))
    }

    fn can_split(&self) -> bool {
        self.colors.len() > 1
    }

    fn split(self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.range();
        let mut colors = self.colors;
        colors.sort_unstable_by_key(|c| (c.rgb[channel], c.rgb));

        let total: u64 = colors.iter().map(|c| c.count as u64).sum();
        let mut acc = 0u64;
        let mut split_idx = 0;
        for (i, c) in colors.iter().enumerate() {
            acc += c.count as u64;
            if acc >= total / 2 {
                split_idx = i;
                break;
            }
        }
        // Both halves must be non-empty.
        let split_idx = split_idx.min(colors.len() - 2);
        let right = colors.split_off(split_idx + 1);
        (ColorBox { colors }, ColorBox { colors: right })
    }

    fn mean(&self) -> [u8; 3] {
        let mut sums = [0u64; 3];
        let mut total = 0u64;
        for c in &self.colors {
            let n = c.count as u64;
            for ch in 0..3 {
                sums[ch] += c.rgb[ch] as u64 * n;
            }
            total += n;
        }
        if total == 0 {
            return [0, 0, 0];
        }
        sums.map(|s| ((s + total / 2) / total) as u8)
    }
}

fn histogram(image: &RgbImage) -> Vec<ColorCount> {
    let mut hist: HashMap<[u8; 3], u32> = HashMap::new();
    for px in image.pixels() {
        *hist.entry(px.0).or_insert(0) += 1;
    }
    let mut colors: Vec<ColorCount> = hist
        .into_iter()
        .map(|(rgb, count)| ColorCount { rgb, count })
        .collect();
    // HashMap order is random; sort so palettes are reproducible.
    colors.sort_unstable_by_key(|c| c.rgb);
    colors
}

/// Build a palette of at most `max_colors` entries.
fn median_cut_palette(colors: Vec<ColorCount>, max_colors: usize) -> Vec<[u8; 3]> {
    if colors.is_empty() {
        return vec![[0, 0, 0]];
    }
    let mut boxes = vec![ColorBox { colors }];
    while boxes.len() < max_colors {
        let Some(idx) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.can_split())
            .max_by_key(|(i, b)| (b.range().1, std::cmp::Reverse(*i)))
            .map(|(i, _)| i)
        else {
            break;
        };
        let (left, right) = boxes.remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }
    boxes.iter().map(ColorBox::mean).collect()
}

fn nearest(color: [u8; 3], palette: &[[u8; 3]]) -> [u8; 3] {
    let mut best = palette[0];
    let mut best_dist = u32::MAX;
    for p in palette {
        let dr = color[0] as i32 - p[0] as i32;
        let dg = color[1] as i32 - p[1] as i32;
        let db = color[2] as i32 - p[2] as i32;
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = *p;
        }
    }
    best
}

/// Reduce `image` to at most `max_colors` distinct colors.
///
/// Images that already fit the budget are returned unchanged.
pub fn quantize(image: &RgbImage, max_colors: u16) -> RgbImage {
    let max_colors = (max_colors as usize).max(1);
    let colors = histogram(image);
    if colors.len() <= max_colors {
        return image.clone();
    }

    let palette = median_cut_palette(colors.clone(), max_colors);
    let lookup: HashMap<[u8; 3], [u8; 3]> = colors
        .iter()
        .map(|c| (c.rgb, nearest(c.rgb, &palette)))
        .collect();

    let mut out = image.clone();
    for px in out.pixels_mut() {
        if let Some(mapped) = lookup.get(&px.0) {
            *px = Rgb(*mapped);
        }
    }
    out
}

/// Number of distinct colors in an image.
pub fn count_colors(image: &RgbImage) -> usize {
    histogram(image).len()
}
