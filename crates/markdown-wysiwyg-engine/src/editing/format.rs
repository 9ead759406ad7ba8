//! Toolbar formatting commands. All of them work on any [`EditorBuffer`].

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::buffer::{Change, DispatchError, EditorBuffer};
use crate::editing::{Patch, Selection};

/// Placeholder wrapped when the selection is empty.
pub const PLACEHOLDER: &str = "text";

pub const TABLE_TEMPLATE: &str = "| Header | Header | Header |\n\
| ------ | ------ | ------ |\n\
| Cell   | Cell   | Cell   |\n\
| Cell   | Cell   | Cell   |\n";

/// Wrap the selection in `before`/`after`, or unwrap it when the markers are
/// already there.
///
/// 1. A selection that includes both markers is unwrapped.
/// 2. Markers just outside the selection are removed. Single-character markers
///    are only removed when the run of that character is odd on both sides,
///    so `*` never eats half of a `**`.
/// 3. Otherwise the selection (or [`PLACEHOLDER`]) is wrapped and the inner
///    text selected.
pub fn toggle_wrap<B: EditorBuffer + ?Sized>(
    buffer: &mut B,
    before: &str,
    after: &str,
) -> Result<Patch, DispatchError> {
    let selection = buffer.selection();
    let (from, to) = (selection.from(), selection.to());
    let text = buffer.text();
    let selected = text.get(from..to).unwrap_or("");

    if selected.len() >= before.len() + after.len()
        && selected.starts_with(before)
        && selected.ends_with(after)
    {
        let inner = &selected[before.len()..selected.len() - after.len()];
        let next = Selection::new(from, from + inner.len());
        return buffer.dispatch(vec![Change::new(from, to, inner)], Some(next));
    }

    if let Some((outer_from, outer_to)) = surrounding_markers(&text, from, to, before, after) {
        let next = Selection::new(outer_from, outer_from + (to - from));
        return buffer.dispatch(
            vec![Change::delete(outer_from, from), Change::delete(to, outer_to)],
            Some(next),
        );
    }

    let inner = if selected.is_empty() { PLACEHOLDER } else { selected };
    let start = from + before.len();
    let next = Selection::new(start, start + inner.len());
    buffer.dispatch(
        vec![Change::new(from, to, format!("{before}{inner}{after}"))],
        Some(next),
    )
}

/// Range of `before..after` markers hugging `[from, to)`, when present.
fn surrounding_markers(text: &str, from: usize, to: usize, before: &str, after: &str) -> Option<(usize, usize)> {
    let outer_from = from.checked_sub(before.len())?;
    let outer_to = to + after.len();
    let present = outer_to <= text.len()
        && text.get(outer_from..from) == Some(before)
        && text.get(to..outer_to) == Some(after);
    (present && markers_balanced(text, from, to, before, after)).then_some((outer_from, outer_to))
}

fn markers_balanced(text: &str, from: usize, to: usize, before: &str, after: &str) -> bool {
    if before != after || before.len() != 1 {
        return true;
    }
    let Some(marker) = before.bytes().next() else {
        return true;
    };
    let left = text.as_bytes()[..from]
        .iter()
        .rev()
        .take_while(|&&byte| byte == marker)
        .count();
    let right = text.as_bytes()[to..]
        .iter()
        .take_while(|&&byte| byte == marker)
        .count();
    left % 2 == 1 && right % 2 == 1
}

/// Multi-line selections get a fence, single-line ones backticks.
pub fn toggle_code<B: EditorBuffer + ?Sized>(buffer: &mut B) -> Result<Patch, DispatchError> {
    let selection = buffer.selection();
    if buffer.slice(selection.from(), selection.to()).contains('\n') {
        toggle_wrap(buffer, "```\n", "\n```")
    } else {
        toggle_wrap(buffer, "`", "`")
    }
}

fn heading_prefix_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"^#{1,6}\s").expect("valid heading prefix regex"))
}

/// Toggle a line prefix such as `## ` or `> ` on the caret's line. An
/// existing heading prefix is replaced rather than stacked.
pub fn toggle_line_prefix<B: EditorBuffer + ?Sized>(
    buffer: &mut B,
    prefix: &str,
) -> Result<Patch, DispatchError> {
    let line = buffer.line_at(buffer.selection().from());
    let line_text = buffer.slice(line.from, line.to);

    if line_text.starts_with(prefix) {
        return buffer.dispatch(vec![Change::delete(line.from, line.from + prefix.len())], None);
    }

    let existing = heading_prefix_regex()
        .find(&line_text)
        .map_or(0, |found| found.end());
    buffer.dispatch(
        vec![Change::new(line.from, line.from + existing, prefix)],
        None,
    )
}

/// Insert `text` at the caret and place the caret after it.
pub fn insert_block<B: EditorBuffer + ?Sized>(buffer: &mut B, text: &str) -> Result<Patch, DispatchError> {
    let at = buffer.selection().from();
    buffer.dispatch(
        vec![Change::insert(at, text)],
        Some(Selection::caret(at + text.len())),
    )
}

/// Insert an empty fenced block with the caret on its blank line.
pub fn insert_code_block<B: EditorBuffer + ?Sized>(buffer: &mut B) -> Result<Patch, DispatchError> {
    let at = buffer.selection().from();
    buffer.dispatch(
        vec![Change::insert(at, "```\n\n```")],
        Some(Selection::caret(at + 4)),
    )
}

/// Insert a 3x3 table and select the first header cell.
pub fn insert_table<B: EditorBuffer + ?Sized>(buffer: &mut B) -> Result<Patch, DispatchError> {
    let at = buffer.selection().from();
    buffer.dispatch(
        vec![Change::insert(at, TABLE_TEMPLATE)],
        Some(Selection::new(at + 2, at + 8)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Document;
    use pretty_assertions::assert_eq;

    fn doc(text: &str, selection: Selection) -> Document {
        let mut doc = Document::from_bytes(text.as_bytes()).unwrap();
        doc.set_selection(selection);
        doc
    }

    // ============ toggle_wrap ============

    #[test]
    fn test_wrap_selection() {
        let mut doc = doc("make bold here", Selection::new(5, 9));

        toggle_wrap(&mut doc, "**", "**").unwrap();

        assert_eq!(doc.text(), "make **bold** here");
        assert_eq!(doc.selection(), Selection::new(7, 11));
    }

    #[test]
    fn test_wrap_empty_selection_inserts_placeholder() {
        let mut doc = doc("ab", Selection::caret(1));

        toggle_wrap(&mut doc, "*", "*").unwrap();

        assert_eq!(doc.text(), "a*text*b");
        assert_eq!(doc.selection(), Selection::new(2, 6));
    }

    #[test]
    fn test_unwrap_selection_including_markers() {
        let mut doc = doc("make **bold** here", Selection::new(5, 13));

        toggle_wrap(&mut doc, "**", "**").unwrap();

        assert_eq!(doc.text(), "make bold here");
        assert_eq!(doc.selection(), Selection::new(5, 9));
    }

    #[test]
    fn test_unwrap_markers_outside_selection() {
        let mut doc = doc("make **bold** here", Selection::new(7, 11));

        toggle_wrap(&mut doc, "**", "**").unwrap();

        assert_eq!(doc.text(), "make bold here");
        assert_eq!(doc.selection(), Selection::new(5, 9));
    }

    #[test]
    fn test_single_marker_does_not_split_bold() {
        // Inside **bold** the `*` runs are even, so italic wraps instead.
        let mut doc = doc("**bold**", Selection::new(2, 6));

        toggle_wrap(&mut doc, "*", "*").unwrap();

        assert_eq!(doc.text(), "***bold***");
    }

    #[test]
    fn test_single_marker_removed_from_bold_italic() {
        let mut doc = doc("***both***", Selection::new(3, 7));

        toggle_wrap(&mut doc, "*", "*").unwrap();

        assert_eq!(doc.text(), "**both**");
    }

    // ============ Line prefixes and inserts ============

    #[test]
    fn test_line_prefix_toggles_and_replaces_headings() {
        let mut doc = doc("## Title\n", Selection::caret(4));

        toggle_line_prefix(&mut doc, "# ").unwrap();
        assert_eq!(doc.text(), "# Title\n");

        toggle_line_prefix(&mut doc, "# ").unwrap();
        assert_eq!(doc.text(), "Title\n");
    }

    #[test]
    fn test_toggle_code_picks_fence_for_multiline() {
        let mut doc = doc("a\nb", Selection::new(0, 3));

        toggle_code(&mut doc).unwrap();

        assert_eq!(doc.text(), "```\na\nb\n```");
    }

    #[test]
    fn test_insert_table_selects_first_header() {
        let mut doc = doc("", Selection::caret(0));

        insert_table(&mut doc).unwrap();

        let selection = doc.selection();
        assert_eq!(&doc.text()[selection.from()..selection.to()], "Header");
    }
}
