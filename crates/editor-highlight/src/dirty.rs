//! Dirty-range set: which parts of the document have stale or missing annotations.

use std::ops::Range;

/// An ascending list of non-overlapping, non-touching ranges.
///
/// The list is expected to stay tiny (one or two entries per recent edit), so every operation is a
/// linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyRanges {
    ranges: Vec<Range<usize>>,
}

impl DirtyRanges {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `range` dirty, merging it with every stored range it overlaps or touches.
    pub fn insert(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }

        // First stored range that ends at or after `range.start` (touching counts).
        let lo = self.ranges.partition_point(|r| r.end < range.start);
        // One past the last stored range that starts at or before `range.end`.
        let hi = self.ranges.partition_point(|r| r.start <= range.end);

        let merged = if lo < hi {
            self.ranges[lo].start.min(range.start)..self.ranges[hi - 1].end.max(range.end)
        } else {
            range
        };
        self.ranges.splice(lo..hi, std::iter::once(merged));
    }

    /// Remove and return every stored sub-range intersecting `range`.
    ///
    /// Only the intersections are taken; the parts of a stored range outside `range` stay dirty.
    /// Afterwards no stored range overlaps `range`.
    pub fn take_intersecting(&mut self, range: Range<usize>) -> Vec<Range<usize>> {
        if range.is_empty() {
            return Vec::new();
        }

        let lo = self.ranges.partition_point(|r| r.end <= range.start);
        let hi = self.ranges.partition_point(|r| r.start < range.end);
        if lo >= hi {
            return Vec::new();
        }

        let mut taken = Vec::with_capacity(hi - lo);
        let mut remainder = Vec::with_capacity(2);
        for r in &self.ranges[lo..hi] {
            taken.push(r.start.max(range.start)..r.end.min(range.end));
            if r.start < range.start {
                remainder.push(r.start..range.start);
            }
            if r.end > range.end {
                remainder.push(range.end..r.end);
            }
        }
        self.ranges.splice(lo..hi, remainder);
        taken
    }

    /// Drop `range` from the set.
    pub fn remove(&mut self, range: Range<usize>) {
        self.take_intersecting(range);
    }

    /// Translate stored ranges through an edit that replaced `old` with `new_len` characters.
    ///
    /// Ranges after the edit shift by the length delta; ranges overlapping it are stretched or
    /// shrunk to the edit boundary. The edited region itself is not marked here.
    pub fn apply_edit(&mut self, old: Range<usize>, new_len: usize) {
        if self.ranges.is_empty() {
            return;
        }

        let new_end = old.start + new_len;
        let map = |pos: usize, inside: usize| -> usize {
            if pos <= old.start {
                pos
            } else if pos >= old.end {
                pos - old.end + new_end
            } else {
                inside
            }
        };

        let ranges = std::mem::take(&mut self.ranges);
        for r in ranges {
            let start = map(r.start, old.start);
            let end = map(r.end, new_end);
            self.insert(start..end);
        }
    }

    /// Whether `offset` lies in a dirty range.
    pub fn contains(&self, offset: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= offset);
        self.ranges.get(idx).is_some_and(|r| r.start <= offset)
    }

    /// Whether any dirty range overlaps `range`.
    pub fn intersects(&self, range: Range<usize>) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= range.start);
        self.ranges.get(idx).is_some_and(|r| r.start < range.end)
    }

    /// First dirty range, if any.
    pub fn first(&self) -> Option<Range<usize>> {
        self.ranges.first().cloned()
    }

    /// Iterate over dirty ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Range<usize>> {
        self.ranges.iter()
    }

    /// Number of stored ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether nothing is dirty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Forget every dirty range.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(ranges: &[Range<usize>]) -> DirtyRanges {
        let mut dirty = DirtyRanges::new();
        for r in ranges {
            dirty.insert(r.clone());
        }
        dirty
    }

    fn ranges(dirty: &DirtyRanges) -> Vec<Range<usize>> {
        dirty.iter().cloned().collect()
    }

    #[test]
    fn test_insert_merges_overlapping_and_touching() {
        let dirty = set(&[10..20, 30..40, 20..25, 50..60, 5..5]);
        assert_eq!(ranges(&dirty), vec![10..25, 30..40, 50..60]);

        let mut dirty = dirty;
        dirty.insert(24..51);
        assert_eq!(ranges(&dirty), vec![10..60]);

        dirty.insert(0..3);
        assert_eq!(ranges(&dirty), vec![0..3, 10..60]);
    }

    #[test]
    fn test_take_intersecting_clips_and_keeps_remainder() {
        let mut dirty = set(&[0..10, 20..30, 40..50]);
        let taken = dirty.take_intersecting(5..45);
        assert_eq!(taken, vec![5..10, 20..30, 40..45]);
        assert_eq!(ranges(&dirty), vec![0..5, 45..50]);
        assert!(!dirty.intersects(5..45));

        // A range strictly inside a stored range splits it.
        let mut dirty = set(&[0..100]);
        assert_eq!(dirty.take_intersecting(40..60), vec![40..60]);
        assert_eq!(ranges(&dirty), vec![0..40, 60..100]);

        assert!(dirty.take_intersecting(40..60).is_empty());
        assert!(dirty.take_intersecting(70..70).is_empty());
    }

    #[test]
    fn test_apply_edit_shifts_and_clamps() {
        // Insertion of 5 chars at 15.
        let mut dirty = set(&[0..10, 12..18, 20..30]);
        dirty.apply_edit(15..15, 5);
        assert_eq!(ranges(&dirty), vec![0..10, 12..23, 25..35]);

        // Deletion of 10..25.
        let mut dirty = set(&[0..5, 8..12, 20..30, 40..45]);
        dirty.apply_edit(10..25, 0);
        assert_eq!(ranges(&dirty), vec![0..5, 8..15, 25..30]);

        // Deleting a range entirely swallows it.
        let mut dirty = set(&[12..14]);
        dirty.apply_edit(10..20, 0);
        assert!(dirty.is_empty());
    }

    #[test]
    fn test_contains_and_intersects() {
        let dirty = set(&[10..20]);
        assert!(dirty.contains(10));
        assert!(dirty.contains(19));
        assert!(!dirty.contains(20));
        assert!(!dirty.contains(9));
        assert!(dirty.intersects(0..11));
        assert!(!dirty.intersects(0..10));
        assert!(!dirty.intersects(20..30));
    }
}
