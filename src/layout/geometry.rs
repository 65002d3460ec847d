//! Cumulative offset table for one axis (rows or columns).
//!
//! Sizes are stored per index; offsets are a prefix sum computed lazily.
//! Mutations only mark the table dirty from the first affected index, so the
//! next lookup recomputes the suffix instead of the whole table. Lookups from
//! pixel to index are a binary search over the offsets, O(log n).
//!
//! Sizes are `f32` pixels; offsets accumulate in `f64` so tables far past
//! 2^24 px (half a million 30px rows) still keep every entry distinct.

use std::cell::{Cell, RefCell};
use std::ops::Range;

/// Smallest size an entry may have. Together with `f64` offsets this keeps
/// offsets strictly increasing, so `index_at_offset(offset_of(i)) == i` holds
/// for every valid index.
pub const MIN_SIZE: f32 = 1.0;

/// Narrow an offset to screen pixels.
#[allow(clippy::cast_possible_truncation)]
pub fn to_pixels(offset: f64) -> f32 {
    offset as f32
}

/// Offset table for a single axis with optional frozen leading/trailing bands.
#[derive(Debug, Clone, Default)]
pub struct GeometryTable {
    sizes: Vec<f32>,
    /// `offsets[i]` = start of entry i; `offsets[len]` = total size.
    offsets: RefCell<Vec<f64>>,
    /// First index whose offset is stale.
    dirty_from: Cell<Option<usize>>,
    leading: usize,
    trailing: usize,
}

impl GeometryTable {
    /// Build a table from per-index sizes.
    pub fn new(sizes: Vec<f32>) -> Self {
        Self {
            sizes: sizes.into_iter().map(clamp_size).collect(),
            offsets: RefCell::new(Vec::new()),
            dirty_from: Cell::new(Some(0)),
            leading: 0,
            trailing: 0,
        }
    }

    /// Build a table where every entry has the same size.
    pub fn uniform(count: usize, size: f32) -> Self {
        Self::new(vec![size; count])
    }

    /// Set the frozen band counts. Bands are clamped so they never overlap.
    #[must_use]
    pub fn with_frozen(mut self, leading: usize, trailing: usize) -> Self {
        self.set_frozen(leading, trailing);
        self
    }

    pub fn set_frozen(&mut self, leading: usize, trailing: usize) {
        let len = self.sizes.len();
        self.leading = leading.min(len);
        self.trailing = trailing.min(len - self.leading);
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn leading_count(&self) -> usize {
        self.leading
    }

    pub fn trailing_count(&self) -> usize {
        self.trailing
    }

    /// Index range that scrolls (everything outside the frozen bands).
    pub fn scrollable_range(&self) -> Range<usize> {
        self.leading..self.sizes.len() - self.trailing
    }

    /// Size of the entry at `index`; out-of-range indices clamp to the last entry.
    pub fn size_of(&self, index: usize) -> f32 {
        let last = self.sizes.len().saturating_sub(1);
        self.sizes.get(index.min(last)).copied().unwrap_or(0.0)
    }

    /// Offset of the leading edge of `index`. `index == len()` yields the total
    /// size; larger indices clamp to it.
    pub fn offset_of(&self, index: usize) -> f64 {
        self.refresh();
        let offsets = self.offsets.borrow();
        let end = offsets.len().saturating_sub(1);
        offsets.get(index.min(end)).copied().unwrap_or(0.0)
    }

    /// Index of the entry covering `offset`. Offsets before the first entry
    /// clamp to 0, offsets past the end clamp to the last index.
    pub fn index_at_offset(&self, offset: f64) -> usize {
        let len = self.sizes.len();
        if len == 0 {
            return 0;
        }
        self.refresh();
        let offsets = self.offsets.borrow();
        let starts_at_or_before = offsets
            .get(..len)
            .map_or(0, |starts| starts.partition_point(|&start| start <= offset));
        starts_at_or_before.saturating_sub(1).min(len - 1)
    }

    /// Number of entries whose leading edge lies strictly before `offset`.
    fn count_starting_before(&self, offset: f64) -> usize {
        let len = self.sizes.len();
        self.refresh();
        let offsets = self.offsets.borrow();
        offsets
            .get(..len)
            .map_or(0, |starts| starts.partition_point(|&start| start < offset))
    }

    pub fn total_size(&self) -> f64 {
        self.offset_of(self.sizes.len())
    }

    /// Size of the leading frozen band.
    pub fn leading_size(&self) -> f64 {
        self.offset_of(self.leading)
    }

    /// Size of the trailing frozen band.
    pub fn trailing_size(&self) -> f64 {
        self.total_size() - self.offset_of(self.sizes.len() - self.trailing)
    }

    /// Size of the scrolling region's content.
    pub fn scrollable_size(&self) -> f64 {
        self.total_size() - self.leading_size() - self.trailing_size()
    }

    /// Mark offsets stale from `index` onward. Entries before `index` keep
    /// their cached offsets.
    pub fn invalidate_from(&self, index: usize) {
        let from = match self.dirty_from.get() {
            Some(current) => current.min(index),
            None => index,
        };
        self.dirty_from.set(Some(from));
    }

    /// Resize one entry. Returns `false` when the index is out of range.
    pub fn set_size(&mut self, index: usize, size: f32) -> bool {
        let Some(slot) = self.sizes.get_mut(index) else {
            return false;
        };
        *slot = clamp_size(size);
        self.invalidate_from(index);
        true
    }

    /// Replace `remove` entries starting at `start` with `insert`.
    ///
    /// Used when expanding or collapsing a tree row: only the suffix after
    /// `start` is recomputed. Frozen bands keep their counts, clamped to the
    /// new length.
    pub fn splice(&mut self, start: usize, remove: usize, insert: impl IntoIterator<Item = f32>) {
        let len = self.sizes.len();
        let start = start.min(len);
        let end = start.saturating_add(remove).min(len);
        self.sizes
            .splice(start..end, insert.into_iter().map(clamp_size));
        self.invalidate_from(start);
        self.set_frozen(self.leading, self.trailing);
    }

    /// Indices of the scrolling region that intersect `[scroll, scroll + extent)`,
    /// where `scroll` is measured from the end of the leading band.
    pub fn visible_range(&self, scroll: f64, extent: f64) -> Range<usize> {
        let scrollable = self.scrollable_range();
        if scrollable.is_empty() || extent <= 0.0 {
            return scrollable.start..scrollable.start;
        }
        let top = self.leading_size() + scroll.max(0.0);
        let start = self
            .index_at_offset(top)
            .clamp(scrollable.start, scrollable.end - 1);
        let end = self
            .count_starting_before(top + extent)
            .clamp(start + 1, scrollable.end);
        start..end
    }

    /// Recompute stale offsets, if any.
    fn refresh(&self) {
        let Some(from) = self.dirty_from.take() else {
            return;
        };
        let mut offsets = self.offsets.borrow_mut();
        offsets.truncate(from.min(self.sizes.len()) + 1);
        if offsets.is_empty() {
            offsets.push(0.0);
        }
        let start = offsets.len() - 1;
        let mut acc = offsets.last().copied().unwrap_or(0.0);
        for size in self.sizes.iter().skip(start) {
            acc += f64::from(*size);
            offsets.push(acc);
        }
    }
}

fn clamp_size(size: f32) -> f32 {
    if size.is_finite() {
        size.max(MIN_SIZE)
    } else {
        MIN_SIZE
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_offsets() {
        let table = GeometryTable::uniform(10, 20.0);
        assert_eq!(table.offset_of(0), 0.0);
        assert_eq!(table.offset_of(3), 60.0);
        assert_eq!(table.total_size(), 200.0);
        assert_eq!(table.offset_of(99), 200.0);
    }

    #[test]
    fn test_index_at_offset_clamps() {
        let table = GeometryTable::uniform(10, 20.0);
        assert_eq!(table.index_at_offset(-5.0), 0);
        assert_eq!(table.index_at_offset(0.0), 0);
        assert_eq!(table.index_at_offset(19.9), 0);
        assert_eq!(table.index_at_offset(20.0), 1);
        assert_eq!(table.index_at_offset(10_000.0), 9);
    }

    #[test]
    fn test_round_trip_variable_sizes() {
        let table = GeometryTable::new(vec![10.0, 35.5, 1.0, 80.0, 22.25]);
        for i in 0..table.len() {
            assert_eq!(table.index_at_offset(table.offset_of(i)), i);
        }
    }

    #[test]
    fn test_round_trip_past_f32_precision() {
        let mut sizes = vec![30.0; 600_000];
        sizes.extend([1.0, 1.0, 30.0]);
        let table = GeometryTable::new(sizes);
        assert_eq!(table.offset_of(600_001), 18_000_001.0);
        for i in [0, 599_999, 600_000, 600_001, 600_002] {
            assert_eq!(table.index_at_offset(table.offset_of(i)), i);
        }
        assert_eq!(table.total_size(), 18_000_032.0);
    }

    #[test]
    fn test_set_size_recomputes_suffix_only() {
        let mut table = GeometryTable::uniform(5, 10.0);
        assert_eq!(table.total_size(), 50.0);
        assert!(table.set_size(3, 30.0));
        assert_eq!(table.offset_of(3), 30.0);
        assert_eq!(table.offset_of(4), 60.0);
        assert_eq!(table.total_size(), 70.0);
        assert!(!table.set_size(5, 30.0));
    }

    #[test]
    fn test_zero_and_nan_sizes_clamp_to_min() {
        let table = GeometryTable::new(vec![0.0, f32::NAN, 5.0]);
        assert_eq!(table.size_of(0), MIN_SIZE);
        assert_eq!(table.size_of(1), MIN_SIZE);
        assert_eq!(table.total_size(), 7.0);
    }

    #[test]
    fn test_splice_insert_and_remove() {
        let mut table = GeometryTable::uniform(4, 10.0);
        table.splice(2, 0, [5.0, 5.0]);
        assert_eq!(table.len(), 6);
        assert_eq!(table.offset_of(4), 30.0);
        assert_eq!(table.total_size(), 50.0);
        table.splice(2, 2, []);
        assert_eq!(table.len(), 4);
        assert_eq!(table.total_size(), 40.0);
    }

    #[test]
    fn test_frozen_bands() {
        let table = GeometryTable::uniform(10, 10.0).with_frozen(2, 1);
        assert_eq!(table.leading_size(), 20.0);
        assert_eq!(table.trailing_size(), 10.0);
        assert_eq!(table.scrollable_size(), 70.0);
        assert_eq!(table.scrollable_range(), 2..9);
    }

    #[test]
    fn test_frozen_bands_never_overlap() {
        let table = GeometryTable::uniform(3, 10.0).with_frozen(2, 5);
        assert_eq!(table.leading_count(), 2);
        assert_eq!(table.trailing_count(), 1);
        assert!(table.scrollable_range().is_empty());
    }

    #[test]
    fn test_visible_range() {
        let table = GeometryTable::uniform(100, 10.0);
        assert_eq!(table.visible_range(0.0, 50.0), 0..5);
        assert_eq!(table.visible_range(5.0, 50.0), 0..6);
        assert_eq!(table.visible_range(950.0, 50.0), 95..100);
        assert_eq!(table.visible_range(0.0, 0.0), 0..0);
    }

    #[test]
    fn test_visible_range_skips_leading_band() {
        let table = GeometryTable::uniform(100, 10.0).with_frozen(3, 0);
        assert_eq!(table.visible_range(0.0, 50.0), 3..8);
    }

    #[test]
    fn test_empty_table() {
        let table = GeometryTable::default();
        assert_eq!(table.total_size(), 0.0);
        assert_eq!(table.index_at_offset(10.0), 0);
        assert_eq!(table.size_of(3), 0.0);
        assert_eq!(table.visible_range(0.0, 100.0), 0..0);
    }
}
