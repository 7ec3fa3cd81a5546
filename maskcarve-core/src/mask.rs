//! Binary silhouette masks and the per-view mask store

use crate::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A binary raster where `true` marks the object and `false` the background.
///
/// Pixels are stored row-major, `(x, y)` with `x < width` and `y < height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Create a mask from row-major pixel values
    pub fn from_raw(width: u32, height: u32, data: Vec<bool>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidData(format!(
                "mask of {}x{} needs {} pixels, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Create a mask with every pixel set to `value`
    pub fn filled(width: u32, height: u32, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Binarize an 8-bit grayscale raster: a pixel is foreground iff its value
    /// is strictly greater than `threshold`.
    pub fn from_gray(width: u32, height: u32, gray: &[u8], threshold: u8) -> Result<Self> {
        Self::from_raw(width, height, gray.iter().map(|&v| v > threshold).collect())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel value at `(x, y)`, or `None` outside the raster
    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        if x < self.width && y < self.height {
            Some(self.data[self.offset(x, y)])
        } else {
            None
        }
    }

    /// Set the pixel at `(x, y)`. Writes outside the raster are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let offset = self.offset(x, y);
            self.data[offset] = value;
        }
    }

    /// Number of foreground pixels
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_all_zero(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Binary dilation with a square all-ones kernel of `kernel_size` pixels,
    /// anchored at `kernel_size / 2`, applied `iterations` times.
    ///
    /// Pixels beyond the border never contribute. A kernel size below 2 is the
    /// identity.
    pub fn dilate(&self, kernel_size: u32, iterations: u32) -> Mask {
        let mut current = self.clone();
        if kernel_size < 2 {
            return current;
        }

        let before = (kernel_size / 2) as usize;
        let after = (kernel_size - 1) as usize - before;
        let (w, h) = (self.width as usize, self.height as usize);

        for _ in 0..iterations {
            // Rows, then columns: a square kernel is separable.
            let mut rows = vec![false; w * h];
            for y in 0..h {
                let line = &current.data[y * w..(y + 1) * w];
                let out = &mut rows[y * w..(y + 1) * w];
                max_filter_line(line.iter().copied(), out.iter_mut(), w, before, after);
            }

            let mut cols = vec![false; w * h];
            for x in 0..w {
                let line: Vec<bool> = (0..h).map(|y| rows[y * w + x]).collect();
                let mut out = vec![false; h];
                max_filter_line(line.into_iter(), out.iter_mut(), h, before, after);
                for (y, v) in out.into_iter().enumerate() {
                    cols[y * w + x] = v;
                }
            }

            current.data = cols;
        }

        current
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Sliding-window "any" over one line: output `i` is set iff some input in
/// `[i - before, i + after]` is set.
fn max_filter_line<'a>(
    input: impl Iterator<Item = bool>,
    output: impl Iterator<Item = &'a mut bool>,
    len: usize,
    before: usize,
    after: usize,
) {
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0usize);
    for v in input {
        let last = *prefix.last().unwrap_or(&0);
        prefix.push(last + v as usize);
    }

    for (i, out) in output.enumerate() {
        let lo = i.saturating_sub(before);
        let hi = (i + after + 1).min(len);
        *out = prefix[hi] > prefix[lo];
    }
}

/// Which masks are informative enough to take part in carving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskPolicy {
    /// Masks with fewer foreground pixels than this are excluded. The default of
    /// one excludes all-zero masks, which would otherwise reject every point in
    /// frame. Zero keeps every mask.
    pub min_foreground_pixels: usize,
}

impl Default for MaskPolicy {
    fn default() -> Self {
        Self {
            min_foreground_pixels: 1,
        }
    }
}

impl MaskPolicy {
    pub fn accepts(&self, mask: &Mask) -> bool {
        mask.foreground_count() >= self.min_foreground_pixels
    }
}

/// Lookup from view identifier to its mask
#[derive(Debug, Clone, Default)]
pub struct MaskStore {
    policy: MaskPolicy,
    masks: BTreeMap<String, Mask>,
    excluded: Vec<String>,
}

impl MaskStore {
    pub fn new(policy: MaskPolicy) -> Self {
        Self {
            policy,
            masks: BTreeMap::new(),
            excluded: Vec::new(),
        }
    }

    /// Add the mask for `view_id`, replacing any previous one.
    ///
    /// Returns `false` if the policy excluded the mask; the view then behaves as
    /// if it had no mask at all.
    pub fn insert(&mut self, view_id: impl Into<String>, mask: Mask) -> bool {
        let view_id = view_id.into();
        if !self.policy.accepts(&mask) {
            warn!(
                "Mask for view '{}' has {} foreground pixels (minimum {}), skipping",
                view_id,
                mask.foreground_count(),
                self.policy.min_foreground_pixels
            );
            self.masks.remove(&view_id);
            self.excluded.push(view_id);
            return false;
        }

        debug!("Stored {}x{} mask for view '{}'", mask.width(), mask.height(), view_id);
        self.masks.insert(view_id, mask);
        true
    }

    /// The mask for `view_id`, if one was stored
    pub fn lookup(&self, view_id: &str) -> Option<&Mask> {
        self.masks.get(view_id)
    }

    pub fn contains(&self, view_id: &str) -> bool {
        self.masks.contains_key(view_id)
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Stored view identifiers in sorted order
    pub fn view_ids(&self) -> impl Iterator<Item = &str> {
        self.masks.keys().map(String::as_str)
    }

    /// Views whose masks the policy rejected, in insertion order
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn policy(&self) -> MaskPolicy {
        self.policy
    }
}
