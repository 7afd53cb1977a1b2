//! # Layer Ranges
//!
//! Inclusive layer ranges and the set arithmetic the gap tracker needs.
//!
//! All functions return ranges sorted by `start`, non-overlapping and
//! non-adjacent (`[1,3]` and `[4,6]` merge into `[1,6]`). Arithmetic is done in
//! `u64` so ranges touching `u32::MAX` never overflow.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::LayerNumber;

/// Inclusive range of layers `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerRange {
    /// First layer in the range.
    pub start: LayerNumber,
    /// Last layer in the range (inclusive).
    pub end: LayerNumber,
}

impl LayerRange {
    /// Build a range, swapping the bounds if given in reverse.
    pub fn new(start: LayerNumber, end: LayerNumber) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A range covering exactly one layer.
    pub fn single(layer: LayerNumber) -> Self {
        Self {
            start: layer,
            end: layer,
        }
    }

    /// Number of layers covered.
    pub fn len(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    /// Always false; a range covers at least one layer.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, layer: LayerNumber) -> bool {
        self.start <= layer && layer <= self.end
    }

    /// Iterate every layer in the range in increasing order.
    pub fn layers(&self) -> impl Iterator<Item = LayerNumber> {
        self.start..=self.end
    }
}

impl fmt::Display for LayerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Sort and coalesce overlapping or adjacent ranges.
pub fn merge_ranges(ranges: impl IntoIterator<Item = LayerRange>) -> Vec<LayerRange> {
    let mut sorted: Vec<LayerRange> = ranges.into_iter().collect();
    sorted.sort_unstable();

    let mut merged: Vec<LayerRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if u64::from(range.start) <= u64::from(last.end) + 1 => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Remove `removed` from a set of ranges, splitting where needed.
pub fn subtract_range(ranges: &[LayerRange], removed: LayerRange) -> Vec<LayerRange> {
    let mut out = Vec::with_capacity(ranges.len() + 1);
    for range in merge_ranges(ranges.iter().copied()) {
        if range.end < removed.start || range.start > removed.end {
            out.push(range);
            continue;
        }
        if range.start < removed.start {
            out.push(LayerRange::new(range.start, removed.start - 1));
        }
        if range.end > removed.end {
            out.push(LayerRange::new(removed.end + 1, range.end));
        }
    }
    out
}

/// Ranges of `[0, upto]` not covered by `present`.
///
/// `present` may be unsorted and contain duplicates or layers above `upto`.
pub fn missing_ranges(present: &[LayerNumber], upto: LayerNumber) -> Vec<LayerRange> {
    let mut layers: Vec<LayerNumber> = present.iter().copied().filter(|l| *l <= upto).collect();
    layers.sort_unstable();
    layers.dedup();

    let mut missing = Vec::new();
    let mut next: u64 = 0;
    for layer in layers {
        if u64::from(layer) > next {
            // `next` is below `layer`, so it fits in a LayerNumber.
            missing.push(LayerRange::new(next as LayerNumber, layer - 1));
        }
        next = u64::from(layer) + 1;
    }
    if next <= u64::from(upto) {
        missing.push(LayerRange::new(next as LayerNumber, upto));
    }
    missing
}
