//! Line lookups over a text snapshot.
//!
//! Lines are split on `\n` only. A line's `to` is the offset of its terminating
//! newline (or the end of the text), so `from..to` never includes the newline.

use serde::Serialize;

/// One line of the document. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Line {
    pub from: usize,
    pub to: usize,
    pub number: usize,
}

impl Line {
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.from..self.to).unwrap_or("")
    }
}

/// Start offsets of every line of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Line containing `pos`. Positions past the end resolve to the last line.
    pub fn line_at(&self, pos: usize) -> Line {
        let pos = pos.min(self.len);
        let index = match self.starts.binary_search(&pos) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        self.line_by_index(index)
    }

    /// Line by 1-based number.
    pub fn line(&self, number: usize) -> Option<Line> {
        if number == 0 || number > self.starts.len() {
            return None;
        }
        Some(self.line_by_index(number - 1))
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        (0..self.starts.len()).map(|index| self.line_by_index(index))
    }

    /// `(row, column)` of a byte offset, both 0-based.
    pub fn point(&self, pos: usize) -> (usize, usize) {
        let line = self.line_at(pos);
        (line.number - 1, pos.min(self.len) - line.from)
    }

    fn line_by_index(&self, index: usize) -> Line {
        let from = self.starts[index];
        let to = match self.starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.len,
        };
        Line {
            from,
            to,
            number: index + 1,
        }
    }
}
