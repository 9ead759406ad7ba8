//! Ordered-list indent and outdent with renumbering.
//!
//! Item structure is read from marker lines and their indentation. A freshly
//! indented item such as `   2. two` cannot interrupt its parent's paragraph
//! until it is renumbered to `1.`, so the grammar would not yet see it as a
//! list item; the marker lines are authoritative here. The syntax tree is
//! only consulted to keep fenced and indented code out of every pass.

use std::sync::OnceLock;

use regex::Regex;

use crate::decorations::DocRange;
use crate::decorations::ranges::{RangeChecker, sort_ranges};
use crate::editing::buffer::{Change, EditorBuffer};
use crate::editing::Document;
use crate::lines::{Line, LineIndex};
use crate::syntax::{NodeKind, SyntaxTree};

/// Indent used when an outdent finds no deeper parent step.
pub const NESTED_LIST_INDENT: usize = 4;

fn ordered_marker_regex() -> &'static Regex {
    static ORDERED: OnceLock<Regex> = OnceLock::new();
    ORDERED.get_or_init(|| Regex::new(r"^(\s*)(\d+)([.)])(\s*)").expect("valid ordered marker regex"))
}

fn bullet_marker_regex() -> &'static Regex {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    BULLET.get_or_init(|| Regex::new(r"^(\s*)[-+*](\s+|$)").expect("valid bullet marker regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OrderedMarker {
    /// Absolute range of the digits
    digits: DocRange,
    delimiter: char,
    /// Marker plus trailing spaces, without the indent
    width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemLine {
    indent: usize,
    ordered: Option<OrderedMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineShape {
    Blank,
    Code,
    Text { indent: usize },
    Item(ItemLine),
}

struct ListLines {
    lines: Vec<Line>,
    shapes: Vec<LineShape>,
}

impl ListLines {
    fn scan(text: &str, index: &LineIndex, syntax: &SyntaxTree) -> Self {
        let code = code_ranges(syntax);
        let mut in_code = RangeChecker::new(&code);

        let lines: Vec<Line> = index.lines().collect();
        let shapes = lines
            .iter()
            .map(|line| {
                let line_text = line.text(text);
                if in_code.contains(line.from) {
                    LineShape::Code
                } else if line_text.trim().is_empty() {
                    LineShape::Blank
                } else if let Some(item) = parse_item_line(*line, line_text) {
                    LineShape::Item(item)
                } else {
                    LineShape::Text {
                        indent: leading_whitespace(line_text),
                    }
                }
            })
            .collect();

        Self { lines, shapes }
    }

    fn item(&self, index: usize) -> Option<ItemLine> {
        match self.shapes.get(index) {
            Some(LineShape::Item(item)) => Some(*item),
            _ => None,
        }
    }

    /// Last line index belonging to the item at `start`, children included.
    fn subtree_end(&self, start: usize, indent: usize) -> usize {
        let mut end = start;
        for index in start + 1..self.shapes.len() {
            match self.shapes[index] {
                LineShape::Blank | LineShape::Code => {}
                LineShape::Text { indent: line_indent } if line_indent > indent => end = index,
                LineShape::Item(item) if item.indent > indent => end = index,
                _ => break,
            }
        }
        end
    }

    /// Innermost item whose subtree contains `line_index`.
    fn enclosing_item(&self, line_index: usize) -> Option<usize> {
        (0..=line_index).rev().find(|&index| {
            self.item(index)
                .is_some_and(|item| self.subtree_end(index, item.indent) >= line_index)
        })
    }

    fn previous_sibling(&self, index: usize, indent: usize) -> Option<usize> {
        for candidate in (0..index).rev() {
            match self.shapes[candidate] {
                LineShape::Blank | LineShape::Code => {}
                LineShape::Item(item) if item.indent == indent => return Some(candidate),
                LineShape::Item(item) if item.indent < indent => return None,
                LineShape::Text { indent: line_indent } if line_indent < indent => return None,
                _ => {}
            }
        }
        None
    }

    fn parent(&self, index: usize, indent: usize) -> Option<ItemLine> {
        (0..index).rev().find_map(|candidate| {
            self.item(candidate).filter(|item| {
                item.indent < indent && self.subtree_end(candidate, item.indent) >= index
            })
        })
    }

    fn current_ordered_item(&self, line_index: usize) -> Option<(usize, ItemLine, OrderedMarker)> {
        let index = self.enclosing_item(line_index)?;
        let item = self.item(index)?;
        let marker = item.ordered?;
        Some((index, item, marker))
    }
}

fn parse_item_line(line: Line, line_text: &str) -> Option<ItemLine> {
    if let Some(captures) = ordered_marker_regex().captures(line_text) {
        let indent = captures.get(1)?.as_str().len();
        let digits = captures.get(2)?;
        let delimiter = captures.get(3)?.as_str().chars().next()?;
        let width = captures.get(0)?.as_str().len() - indent;
        return Some(ItemLine {
            indent,
            ordered: Some(OrderedMarker {
                digits: DocRange::new(line.from + digits.start(), line.from + digits.end()),
                delimiter,
                width,
            }),
        });
    }

    let captures = bullet_marker_regex().captures(line_text)?;
    Some(ItemLine {
        indent: captures.get(1)?.as_str().len(),
        ordered: None,
    })
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn code_ranges(syntax: &SyntaxTree) -> Vec<DocRange> {
    let mut ranges: Vec<DocRange> = syntax
        .iter()
        .filter(|node| {
            matches!(
                node.kind(),
                NodeKind::FencedCodeBlock | NodeKind::IndentedCodeBlock
            )
        })
        .map(|node| node.range())
        .collect();
    sort_ranges(&mut ranges);
    ranges
}

fn caret_in_code(syntax: &SyntaxTree, pos: usize) -> bool {
    let node = syntax.resolve(pos);
    node.kind().is_code() || node.ancestors().any(|ancestor| ancestor.kind().is_code())
}

/// Indent the ordered item under the caret, children included, then renumber.
pub fn indent_ordered_list_item(doc: &mut Document) -> bool {
    let Some((_, lines, index, item, marker)) = ordered_item_at_caret(doc) else {
        return false;
    };

    let step = lines
        .previous_sibling(index, item.indent)
        .and_then(|sibling| nested_ordered_indent(&lines, sibling, item.indent))
        .unwrap_or(marker.width.max(1));

    let end = lines.subtree_end(index, item.indent);
    let padding = " ".repeat(step);
    let changes: Vec<Change> = lines.lines[index..=end]
        .iter()
        .map(|line| Change::insert(line.from, padding.clone()))
        .collect();

    apply_and_renumber(doc, changes)
}

/// Outdent the ordered item under the caret, children included, then
/// renumber. Top-level items are left alone.
pub fn outdent_ordered_list_item(doc: &mut Document) -> bool {
    let Some((text, lines, index, item, _)) = ordered_item_at_caret(doc) else {
        return false;
    };
    if item.indent == 0 {
        return false;
    }

    let Some(parent) = lines.parent(index, item.indent) else {
        return false;
    };
    let step = match item.indent - parent.indent {
        0 => NESTED_LIST_INDENT.min(item.indent),
        step => step,
    };

    let end = lines.subtree_end(index, item.indent);
    let changes: Vec<Change> = lines.lines[index..=end]
        .iter()
        .filter_map(|line| {
            let remove = step.min(leading_whitespace(line.text(&text)));
            (remove > 0).then(|| Change::delete(line.from, line.from + remove))
        })
        .collect();
    if changes.is_empty() {
        return false;
    }

    apply_and_renumber(doc, changes)
}

type CaretItem = (String, ListLines, usize, ItemLine, OrderedMarker);

fn ordered_item_at_caret(doc: &Document) -> Option<CaretItem> {
    let selection = doc.selection();
    if !selection.is_empty() || caret_in_code(doc.syntax(), selection.head) {
        return None;
    }

    let text = doc.text();
    let lines = ListLines::scan(&text, doc.lines(), doc.syntax());
    let line_index = doc.lines().line_at(selection.head).number - 1;
    let (index, item, marker) = lines.current_ordered_item(line_index)?;
    Some((text, lines, index, item, marker))
}

/// Indent of the first ordered item nested under `sibling`, relative to `indent`.
fn nested_ordered_indent(lines: &ListLines, sibling: usize, indent: usize) -> Option<usize> {
    let end = lines.subtree_end(sibling, indent);
    (sibling + 1..=end)
        .filter_map(|index| lines.item(index))
        .find(|item| item.indent > indent)
        .filter(|item| item.ordered.is_some())
        .map(|item| item.indent - indent)
}

fn apply_and_renumber(doc: &mut Document, changes: Vec<Change>) -> bool {
    if changes.is_empty() {
        return false;
    }
    if let Err(err) = doc.dispatch(changes, None) {
        log::warn!("List indentation change rejected: {err}");
        return false;
    }

    let renumber = renumber_changes(&doc.text(), doc.lines(), doc.syntax());
    if renumber.is_empty() {
        return true;
    }
    if let Err(err) = doc.dispatch(renumber, None) {
        log::warn!("List renumbering rejected: {err}");
    }
    true
}

/// Changes that renumber every ordered list from 1, keeping each item's
/// delimiter. A different delimiter or a bullet at the same indent starts a
/// new list.
pub fn renumber_changes(text: &str, index: &LineIndex, syntax: &SyntaxTree) -> Vec<Change> {
    struct OpenList {
        indent: usize,
        delimiter: Option<char>,
        next: usize,
    }

    let lines = ListLines::scan(text, index, syntax);
    let mut open: Vec<OpenList> = Vec::new();
    let mut changes = Vec::new();
    let mut after_blank = false;

    for shape in &lines.shapes {
        match *shape {
            LineShape::Code => {}
            LineShape::Blank => after_blank = true,
            LineShape::Text { indent } => {
                if after_blank {
                    open.retain(|list| list.indent < indent);
                }
                after_blank = false;
            }
            LineShape::Item(item) => {
                after_blank = false;
                open.retain(|list| list.indent <= item.indent);
                let delimiter = item.ordered.map(|marker| marker.delimiter);

                let continues = open
                    .last()
                    .is_some_and(|list| list.indent == item.indent && list.delimiter == delimiter);
                if !continues {
                    if open.last().is_some_and(|list| list.indent == item.indent) {
                        open.pop();
                    }
                    open.push(OpenList {
                        indent: item.indent,
                        delimiter,
                        next: 1,
                    });
                }

                let Some(marker) = item.ordered else {
                    continue;
                };
                let Some(list) = open.last_mut() else {
                    continue;
                };
                let expected = list.next.to_string();
                list.next += 1;
                if text.get(marker.digits.from..marker.digits.to) != Some(expected.as_str()) {
                    changes.push(Change::new(marker.digits.from, marker.digits.to, expected));
                }
            }
        }
    }

    changes
}
