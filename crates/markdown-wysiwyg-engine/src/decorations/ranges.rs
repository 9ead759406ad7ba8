//! Selection and range predicates shared by every decoration pass.

use serde::Serialize;

use crate::editing::Selection;
use crate::lines::LineIndex;

/// Half-open byte range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DocRange {
    pub from: usize,
    pub to: usize,
}

impl DocRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to: to.max(from),
        }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.from && pos < self.to
    }

    pub fn overlaps(&self, other: &DocRange) -> bool {
        self.from < other.to && other.from < self.to
    }
}

impl From<std::ops::Range<usize>> for DocRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        DocRange::new(range.start, range.end)
    }
}

/// A caret touches `[from, to)` when it sits inside it; a non-empty selection
/// touches it when the two overlap at all.
pub fn is_selection_in_range(selection: &Selection, from: usize, to: usize) -> bool {
    if selection.is_empty() {
        let pos = selection.head;
        return pos >= from && pos < to;
    }
    selection.from() < to && selection.to() > from
}

/// Whether `cursor_line` (1-based) is one of the lines spanned by `[from, to)`.
///
/// The end is probed at `to - 1` so a range ending exactly at a line start does
/// not claim that line.
pub fn is_cursor_on_range_line(lines: &LineIndex, cursor_line: usize, from: usize, to: usize) -> bool {
    let start_line = lines.line_at(from).number;
    let end_line = lines.line_at(from.max(to.saturating_sub(1))).number;
    cursor_line >= start_line && cursor_line <= end_line
}

/// Membership probe over ranges sorted by `from`.
///
/// The probe keeps a cursor into the list and only moves forward, so callers
/// must query positions in non-decreasing order.
pub struct RangeChecker<'a> {
    ranges: &'a [DocRange],
    index: usize,
}

impl<'a> RangeChecker<'a> {
    pub fn new(ranges: &'a [DocRange]) -> Self {
        Self { ranges, index: 0 }
    }

    pub fn contains(&mut self, pos: usize) -> bool {
        while self.index < self.ranges.len() && self.ranges[self.index].to <= pos {
            self.index += 1;
        }
        match self.ranges.get(self.index) {
            Some(range) => range.contains(pos),
            None => false,
        }
    }
}

/// Sort by start so the list can drive a [`RangeChecker`].
pub fn sort_ranges(ranges: &mut [DocRange]) {
    ranges.sort_by_key(|range| (range.from, range.to));
}

/// True when `range` intersects any of the sorted `excluded` ranges.
pub fn overlaps_any(range: DocRange, excluded: &[DocRange]) -> bool {
    for candidate in excluded {
        if candidate.to <= range.from {
            continue;
        }
        if candidate.from >= range.to {
            break;
        }
        return true;
    }
    false
}

/// Pieces of `range` left after cutting out the sorted `excluded` ranges.
pub fn split_excluding(range: DocRange, excluded: &[DocRange]) -> Vec<DocRange> {
    let mut segments = Vec::new();
    let mut current = range.from;

    for candidate in excluded {
        if candidate.to <= current {
            continue;
        }
        if candidate.from >= range.to {
            break;
        }
        let segment_end = candidate.from.min(range.to);
        if current < segment_end {
            segments.push(DocRange::new(current, segment_end));
        }
        current = current.max(candidate.to);
        if current >= range.to {
            break;
        }
    }

    if current < range.to {
        segments.push(DocRange::new(current, range.to));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ============ Selection overlap ============

    #[rstest]
    #[case::caret_at_start(5, 5, true)]
    #[case::caret_inside(7, 7, true)]
    #[case::caret_at_end(10, 10, false)]
    #[case::caret_before(4, 4, false)]
    #[case::selection_overlapping_start(2, 6, true)]
    #[case::selection_ending_at_start(2, 5, false)]
    #[case::selection_covering(0, 20, true)]
    #[case::selection_starting_at_end(10, 12, false)]
    fn test_is_selection_in_range(#[case] anchor: usize, #[case] head: usize, #[case] expected: bool) {
        let selection = Selection::new(anchor, head);
        assert_eq!(is_selection_in_range(&selection, 5, 10), expected);
    }

    #[test]
    fn test_backwards_selection_uses_normalized_bounds() {
        let selection = Selection::new(12, 8);
        assert!(is_selection_in_range(&selection, 5, 10));
    }

    // ============ Line reveal ============

    #[test]
    fn test_cursor_on_range_line() {
        let text = "# Title\nbody\nmore\n";
        let lines = LineIndex::new(text);

        // Heading node spanning "# Title\n" ends at the start of line 2.
        assert!(is_cursor_on_range_line(&lines, 1, 0, 8));
        assert!(!is_cursor_on_range_line(&lines, 2, 0, 8));
        assert!(is_cursor_on_range_line(&lines, 3, 8, 17));
    }

    #[test]
    fn test_cursor_on_empty_range_line() {
        let lines = LineIndex::new("ab\ncd");
        assert!(is_cursor_on_range_line(&lines, 2, 3, 3));
    }

    // ============ Range checker ============

    #[test]
    fn test_range_checker_advances_monotonically() {
        let ranges = vec![DocRange::new(2, 4), DocRange::new(8, 10)];
        let mut checker = RangeChecker::new(&ranges);

        assert!(!checker.contains(0));
        assert!(checker.contains(2));
        assert!(checker.contains(3));
        assert!(!checker.contains(4));
        assert!(checker.contains(9));
        assert!(!checker.contains(10));
        assert!(!checker.contains(50));
    }

    // ============ Exclusion helpers ============

    #[test]
    fn test_split_excluding_cuts_out_ranges() {
        let excluded = vec![DocRange::new(3, 5), DocRange::new(8, 9)];

        assert_eq!(
            split_excluding(DocRange::new(0, 10), &excluded),
            vec![
                DocRange::new(0, 3),
                DocRange::new(5, 8),
                DocRange::new(9, 10)
            ]
        );
        assert_eq!(split_excluding(DocRange::new(3, 5), &excluded), vec![]);
    }

    #[test]
    fn test_overlaps_any() {
        let excluded = vec![DocRange::new(3, 5)];

        assert!(overlaps_any(DocRange::new(4, 8), &excluded));
        assert!(!overlaps_any(DocRange::new(5, 8), &excluded));
        assert!(!overlaps_any(DocRange::new(0, 3), &excluded));
    }
}
