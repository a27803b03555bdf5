use std::collections::HashMap;

use palette::Srgb;

use crate::normalize::PixelMatrix;

/// Upper bound on the quantized palette the counting estimator works with.
pub const MAX_QUANTIZED_COLORS: usize = 64;

/// A quantized color and the number of pixels mapped onto it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub color: Srgb<u8>,
    pub count: usize,
}

type Key = [u8; 3];

#[inline(always)]
fn key(c: Srgb<u8>) -> Key {
    [c.red, c.green, c.blue]
}

/// Distinct colors with their pixel counts, in order of first appearance.
fn histogram(pixels: &[Srgb<u8>]) -> Vec<(Key, usize)> {
    let mut index: HashMap<Key, usize> = HashMap::new();
    let mut entries: Vec<(Key, usize)> = Vec::new();
    for &p in pixels {
        let k = key(p);
        match index.get(&k) {
            Some(&i) => entries[i].1 += 1,
            None => {
                index.insert(k, entries.len());
                entries.push((k, 1));
            }
        }
    }
    entries
}

// ------------------------------------------------------------
// Weighted median cut
// ------------------------------------------------------------

struct ColorBox {
    entries: Vec<(Key, usize)>,
}

impl ColorBox {
    fn population(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Per-channel `max - min`.
    fn ranges(&self) -> [u8; 3] {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for (c, _) in &self.entries {
            for ch in 0..3 {
                lo[ch] = lo[ch].min(c[ch]);
                hi[ch] = hi[ch].max(c[ch]);
            }
        }
        [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]]
    }

    fn widest_channel(&self) -> usize {
        let r = self.ranges();
        if r[0] >= r[1] && r[0] >= r[2] {
            0
        } else if r[1] >= r[2] {
            1
        } else {
            2
        }
    }

    /// Busy boxes with a wide spread split first.
    fn priority(&self) -> u64 {
        let r = self.ranges();
        self.population() as u64 * r[0].max(r[1]).max(r[2]) as u64
    }

    /// Population-weighted mean, rounded to the nearest byte.
    fn mean(&self) -> Srgb<u8> {
        let mut sum = [0u64; 3];
        let mut total = 0u64;
        for (c, n) in &self.entries {
            let n = *n as u64;
            for ch in 0..3 {
                sum[ch] += c[ch] as u64 * n;
            }
            total += n;
        }
        let avg = |s: u64| ((s + total / 2) / total.max(1)) as u8;
        Srgb::new(avg(sum[0]), avg(sum[1]), avg(sum[2]))
    }

    /// Split along the widest channel at the weighted median. Each half
    /// keeps at least one color.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let axis = self.widest_channel();
        self.entries.sort_by_key(|(c, _)| c[axis]);

        let half = self.population().div_ceil(2);
        let mut acc = 0usize;
        let mut split_idx = 1;
        for (i, (_, n)) in self.entries.iter().enumerate() {
            acc += n;
            if acc >= half {
                split_idx = i + 1;
                break;
            }
        }
        split_idx = split_idx.clamp(1, self.entries.len() - 1);

        let right = self.entries.split_off(split_idx);
        (ColorBox { entries: self.entries }, ColorBox { entries: right })
    }
}

fn median_cut(histogram: Vec<(Key, usize)>, max_colors: usize) -> Vec<Srgb<u8>> {
    let mut boxes = vec![ColorBox { entries: histogram }];

    while boxes.len() < max_colors {
        let mut best: Option<(usize, u64)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if b.entries.len() < 2 {
                continue;
            }
            let p = b.priority();
            if best.is_none_or(|(_, bp)| p > bp) {
                best = Some((i, p));
            }
        }
        let Some((idx, _)) = best else { break };

        let (left, right) = boxes.remove(idx).split();
        boxes.insert(idx, left);
        boxes.push(right);
    }

    boxes.iter().map(ColorBox::mean).collect()
}

/// Reduce `pixels` to at most `max_colors` representative colors.
///
/// Images that already have few enough colors keep them verbatim, in order
/// of first appearance; otherwise a weighted median cut is used.
pub fn quantize(pixels: &[Srgb<u8>], max_colors: usize) -> Vec<Srgb<u8>> {
    let max_colors = max_colors.max(1);
    let hist = histogram(pixels);
    if hist.is_empty() {
        return Vec::new();
    }
    if hist.len() <= max_colors {
        return hist.into_iter().map(|(c, _)| Srgb::new(c[0], c[1], c[2])).collect();
    }
    median_cut(hist, max_colors)
}

/// Index of the closest palette color by squared RGB distance; ties go to
/// the lower index.
fn nearest(palette: &[Srgb<u8>], c: Key) -> usize {
    let mut best_idx = 0;
    let mut best_dist = i32::MAX;
    for (idx, p) in palette.iter().enumerate() {
        let dr = c[0] as i32 - p.red as i32;
        let dg = c[1] as i32 - p.green as i32;
        let db = c[2] as i32 - p.blue as i32;
        let dist = dr * dr + dg * dg + db * db;
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}

/// The `k` most frequent quantized colors of `matrix`.
///
/// Steps performed:
/// 1. Quantize to at most `max_colors` colors.
/// 2. Map every pixel to its nearest quantized color.
/// 3. Count pixels per quantized color.
/// 4. Sort by count, descending; equal counts keep first-appearance order.
///
/// Returns fewer than `k` buckets when fewer quantized colors exist.
pub fn dominant(matrix: &PixelMatrix, k: usize, max_colors: usize) -> Vec<Bucket> {
    let pixels = matrix.pixels();
    let palette = quantize(pixels, max_colors);

    // The histogram is in first-appearance order, so walking it visits each
    // quantized color at its first appearance too.
    let mut slot: HashMap<Key, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();
    for (c, n) in histogram(pixels) {
        let q = palette[nearest(&palette, c)];
        match slot.get(&key(q)) {
            Some(&i) => buckets[i].count += n,
            None => {
                slot.insert(key(q), buckets.len());
                buckets.push(Bucket { color: q, count: n });
            }
        }
    }

    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets.truncate(k);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(pixels: &[(u8, u8, u8)], width: u32) -> PixelMatrix {
        let height = pixels.len() as u32 / width;
        let px = pixels.iter().map(|&(r, g, b)| Srgb::new(r, g, b)).collect();
        PixelMatrix::from_pixels(width, height, px).unwrap()
    }

    fn gradient() -> PixelMatrix {
        let px: Vec<(u8, u8, u8)> = (0..4096u32)
            .map(|i| (((i >> 8) * 17) as u8, (((i >> 4) & 15) * 17) as u8, ((i & 15) * 17) as u8))
            .collect();
        matrix(&px, 64)
    }

    #[test]
    fn two_by_two_ranks_majority_first() {
        let m = matrix(&[(255, 0, 0), (255, 0, 0), (0, 255, 0), (0, 0, 255)], 2);
        let buckets = dominant(&m, 3, MAX_QUANTIZED_COLORS);
        let colors: Vec<Srgb<u8>> = buckets.iter().map(|b| b.color).collect();
        assert_eq!(
            colors,
            vec![Srgb::new(255, 0, 0), Srgb::new(0, 255, 0), Srgb::new(0, 0, 255)]
        );
        assert_eq!(buckets[0].count, 2);
    }

    #[test]
    fn ties_keep_first_appearance() {
        let m = matrix(&[(0, 0, 9), (9, 0, 0), (0, 9, 0), (9, 0, 0), (0, 9, 0), (0, 0, 9)], 3);
        let colors: Vec<Srgb<u8>> = dominant(&m, 3, 64).iter().map(|b| b.color).collect();
        assert_eq!(
            colors,
            vec![Srgb::new(0, 0, 9), Srgb::new(9, 0, 0), Srgb::new(0, 9, 0)]
        );
    }

    #[test]
    fn no_padding_when_few_colors() {
        let m = matrix(&[(1, 1, 1); 4], 2);
        let buckets = dominant(&m, 10, 64);
        assert_eq!(buckets, vec![Bucket { color: Srgb::new(1, 1, 1), count: 4 }]);
    }

    #[test]
    fn quantize_caps_palette_size() {
        let m = gradient();
        let palette = quantize(m.pixels(), 64);
        assert!(!palette.is_empty());
        assert!(palette.len() <= 64);
        let palette = quantize(m.pixels(), 8);
        assert!(palette.len() <= 8);
    }

    #[test]
    fn counts_cover_every_pixel() {
        let m = gradient();
        let buckets = dominant(&m, usize::MAX, 64);
        assert!(buckets.len() <= 64);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 4096);
        assert!(buckets.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn deterministic() {
        let m = gradient();
        assert_eq!(dominant(&m, 10, 64), dominant(&m, 10, 64));
        assert_eq!(dominant(&m, 10, 64).len(), 10);
    }

    #[test]
    fn split_keeps_both_halves_non_empty() {
        let b = ColorBox {
            entries: vec![([0, 0, 0], 100), ([255, 0, 0], 1)],
        };
        let (l, r) = b.split();
        assert_eq!(l.entries.len(), 1);
        assert_eq!(r.entries.len(), 1);
    }

    #[test]
    fn nearest_prefers_lower_index_on_tie() {
        let palette = [Srgb::new(0, 0, 0), Srgb::new(2, 0, 0)];
        assert_eq!(nearest(&palette, [1, 0, 0]), 0);
        assert_eq!(nearest(&palette, [2, 0, 0]), 1);
    }
}
