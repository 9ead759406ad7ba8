//! Raw-text math scanning.
//!
//! The markdown grammar has no math nodes, so `$$` blocks and `$...$` spans
//! are found line by line. Anything inside a code range is ignored, and
//! inline spans never start inside a block span.

use serde::Serialize;

use super::ranges::{DocRange, RangeChecker, is_cursor_on_range_line, is_selection_in_range, sort_ranges};
use crate::editing::Selection;
use crate::lines::LineIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathSpan {
    pub range: DocRange,
    /// Source between the delimiters. Block content keeps its inner lines
    /// joined with `\n`.
    pub content: String,
    pub display: bool,
    /// The selection touches the span, so it stays raw text.
    pub revealed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathScan {
    pub spans: Vec<MathSpan>,
    /// Every closed block, revealed or not. Later passes treat these as claimed.
    pub block_ranges: Vec<DocRange>,
}

/// Scan `text` for block then inline math. `code_ranges` must be sorted.
pub fn scan_math(
    text: &str,
    lines: &LineIndex,
    selection: &Selection,
    code_ranges: &[DocRange],
) -> MathScan {
    let cursor_line = lines.line_at(selection.head).number;
    let mut scan = MathScan::default();

    scan_block_math(text, lines, selection, cursor_line, code_ranges, &mut scan);

    let mut excluded: Vec<DocRange> = code_ranges
        .iter()
        .chain(scan.block_ranges.iter())
        .copied()
        .collect();
    sort_ranges(&mut excluded);
    let mut in_excluded = RangeChecker::new(&excluded);

    for line in lines.lines() {
        let line_text = line.text(text);
        for (start, end) in find_inline_math(line_text) {
            let from = line.from + start;
            let to = line.from + end;
            let start_excluded = in_excluded.contains(from);
            let end_excluded = in_excluded.contains(to - 1);
            if start_excluded || end_excluded {
                continue;
            }
            scan.spans.push(MathSpan {
                range: DocRange::new(from, to),
                content: line_text[start + 1..end - 1].to_string(),
                display: false,
                revealed: is_selection_in_range(selection, from, to),
            });
        }
    }

    scan
}

fn scan_block_math(
    text: &str,
    lines: &LineIndex,
    selection: &Selection,
    cursor_line: usize,
    code_ranges: &[DocRange],
    scan: &mut MathScan,
) {
    let mut in_code = RangeChecker::new(code_ranges);
    let mut open: Option<(usize, Vec<&str>)> = None;

    for line in lines.lines() {
        let line_text = line.text(text);
        let is_delimiter = !in_code.contains(line.from) && line_text.trim() == "$$";

        match open.take() {
            None => {
                if is_delimiter {
                    open = Some((line.from, Vec::new()));
                }
            }
            Some((start, body)) if is_delimiter => {
                let range = DocRange::new(start, line.to);
                let revealed = is_selection_in_range(selection, range.from, range.to)
                    || is_cursor_on_range_line(lines, cursor_line, range.from, range.to);
                scan.block_ranges.push(range);
                scan.spans.push(MathSpan {
                    range,
                    content: body.join("\n"),
                    display: true,
                    revealed,
                });
            }
            Some((start, mut body)) => {
                body.push(line_text);
                open = Some((start, body));
            }
        }
    }
}

/// Byte spans of `$...$` within one line, delimiters included.
///
/// A delimiter may not touch another `$`, so `$$` never opens or closes an
/// inline span. The closing `$` is the nearest one satisfying that rule.
pub fn find_inline_math(line: &str) -> Vec<(usize, usize)> {
    let bytes = line.as_bytes();
    let is_dollar = |i: usize| bytes.get(i) == Some(&b'$');
    let mut spans = Vec::new();
    let mut start = 0;

    while start < bytes.len() {
        let opens = is_dollar(start)
            && (start == 0 || !is_dollar(start - 1))
            && !is_dollar(start + 1);
        if !opens {
            start += 1;
            continue;
        }

        let close = (start + 2..bytes.len()).find(|&j| is_dollar(j) && !is_dollar(j + 1));
        match close {
            Some(end) => {
                spans.push((start, end + 1));
                start = end + 1;
            }
            None => start += 1,
        }
    }

    spans
}
