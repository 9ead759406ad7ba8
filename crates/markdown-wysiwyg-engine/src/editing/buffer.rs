//! The text buffer seam.
//!
//! Everything that wants to change document text goes through
//! [`EditorBuffer::dispatch`]. [`crate::editing::Document`] is the in-crate
//! implementation; hosts with their own buffer implement the trait directly.

use serde::Serialize;
use thiserror::Error;

use crate::editing::Patch;
use crate::lines::Line;

/// Anchor and head as byte offsets. The head is where the caret is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn caret(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.from()..self.to()
    }

    pub fn clamp(&self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

impl From<std::ops::Range<usize>> for Selection {
    fn from(range: std::ops::Range<usize>) -> Self {
        Selection::new(range.start, range.end)
    }
}

/// Replace `[from, to)` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl Change {
    pub fn new(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::new(from, to, "")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Another update is being applied. Retry on the next frame.
    #[error("Buffer is busy applying another update")]
    Busy,
    #[error("Change {index} ({from}..{to}) overlaps or precedes the previous change")]
    Unordered { index: usize, from: usize, to: usize },
    #[error("Change {from}..{to} is inverted")]
    Inverted { from: usize, to: usize },
    /// An end of the change falls inside a multi-byte character.
    #[error("Change {from}..{to} splits a character")]
    Misaligned { from: usize, to: usize },
}

/// Text buffer operations the decoration engine and widgets depend on.
pub trait EditorBuffer {
    fn text(&self) -> String;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn selection(&self) -> Selection;

    /// Apply `changes` (ascending, non-overlapping, in pre-change offsets) and
    /// optionally move the selection. Offsets past the end are clamped; offsets
    /// inside a character are rejected with [`DispatchError::Misaligned`].
    fn dispatch(
        &mut self,
        changes: Vec<Change>,
        selection: Option<Selection>,
    ) -> Result<Patch, DispatchError>;

    fn line_at(&self, pos: usize) -> Line;

    /// Text of `[from, to)`, clamped to the buffer.
    fn slice(&self, from: usize, to: usize) -> String {
        let text = self.text();
        let to = to.min(text.len());
        let from = from.min(to);
        text.get(from..to).unwrap_or("").to_string()
    }

    fn focus(&mut self) {}

    fn undo(&mut self) -> bool {
        false
    }

    fn redo(&mut self) -> bool {
        false
    }
}

/// Largest char boundary of `text` at or before `pos`.
pub fn floor_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Clamp every change to `text` and reject unordered, overlapping or
/// misaligned lists.
pub fn normalize_changes(changes: Vec<Change>, text: &str) -> Result<Vec<Change>, DispatchError> {
    let len = text.len();
    let mut normalized = Vec::with_capacity(changes.len());
    let mut previous_end = 0;

    for (index, change) in changes.into_iter().enumerate() {
        if change.from > change.to {
            return Err(DispatchError::Inverted {
                from: change.from,
                to: change.to,
            });
        }
        let from = change.from.min(len);
        let to = change.to.min(len);
        if !text.is_char_boundary(from) || !text.is_char_boundary(to) {
            return Err(DispatchError::Misaligned {
                from: change.from,
                to: change.to,
            });
        }
        if index > 0 && from < previous_end {
            return Err(DispatchError::Unordered {
                index,
                from: change.from,
                to: change.to,
            });
        }
        if from != change.from || to != change.to {
            log::warn!(
                "Clamped stale change {}..{} to {from}..{to} (buffer length {len})",
                change.from,
                change.to
            );
        }
        previous_end = to;
        normalized.push(Change::new(from, to, change.insert));
    }

    Ok(normalized)
}

/// Map a position through already normalized changes. `assoc_after` keeps a
/// position at an insertion point after the inserted text.
pub fn map_position(changes: &[Change], pos: usize, assoc_after: bool) -> usize {
    let mut shift: isize = 0;
    for change in changes {
        if change.to < pos || (change.to == pos && change.from < pos) {
            shift += change.insert.len() as isize - (change.to - change.from) as isize;
        } else if change.from < pos && pos < change.to {
            return (change.from as isize + shift) as usize + change.insert.len();
        } else if change.from == pos && change.to == pos && assoc_after {
            shift += change.insert.len() as isize;
        } else {
            break;
        }
    }
    (pos as isize + shift).max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_selection_orders_anchor_and_head() {
        let backwards = Selection::new(9, 3);

        assert_eq!(backwards.from(), 3);
        assert_eq!(backwards.to(), 9);
        assert!(!backwards.is_empty());
        assert!(Selection::caret(4).is_empty());
        assert_eq!(backwards.clamp(5), Selection::new(5, 3));
    }

    #[test]
    fn test_normalize_clamps_stale_offsets() {
        let changes = normalize_changes(vec![Change::new(3, 40, "x")], "0123456789").unwrap();
        assert_eq!(changes, vec![Change::new(3, 10, "x")]);
    }

    #[test]
    fn test_normalize_rejects_overlap_and_inversion() {
        let overlap = normalize_changes(vec![Change::new(0, 5, ""), Change::new(4, 6, "")], "0123456789");
        assert_eq!(
            overlap,
            Err(DispatchError::Unordered {
                index: 1,
                from: 4,
                to: 6
            })
        );

        let inverted = normalize_changes(vec![Change::new(5, 2, "")], "0123456789");
        assert_eq!(inverted, Err(DispatchError::Inverted { from: 5, to: 2 }));
    }

    #[test]
    fn test_normalize_rejects_offsets_inside_a_character() {
        // "é" is two bytes
        let split = normalize_changes(vec![Change::new(1, 3, "x")], "ééé");
        assert_eq!(split, Err(DispatchError::Misaligned { from: 1, to: 3 }));

        let aligned = normalize_changes(vec![Change::new(2, 4, "e")], "ééé").unwrap();
        assert_eq!(aligned, vec![Change::new(2, 4, "e")]);
    }

    #[rstest]
    #[case::start(0, 0)]
    #[case::inside_first(1, 0)]
    #[case::boundary(2, 2)]
    #[case::inside_last(5, 4)]
    #[case::past_end(40, 6)]
    fn test_floor_char_boundary(#[case] pos: usize, #[case] expected: usize) {
        assert_eq!(floor_char_boundary("ééé", pos), expected);
    }

    #[rstest]
    #[case::before_insert(2, false, 2)]
    #[case::at_insert_stays(5, false, 5)]
    #[case::at_insert_moves(5, true, 8)]
    #[case::after_insert(7, false, 10)]
    #[case::inside_deletion(12, false, 13)]
    #[case::after_deletion(20, false, 18)]
    fn test_map_position(#[case] pos: usize, #[case] assoc_after: bool, #[case] expected: usize) {
        // insert "abc" at 5, delete 10..15 (net -5), net shift after both = -2
        let changes = vec![Change::insert(5, "abc"), Change::delete(10, 15)];
        assert_eq!(map_position(&changes, pos, assoc_after), expected);
    }
}
