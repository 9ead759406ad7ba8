use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::buffer::{Change, floor_char_boundary, map_position};
use crate::editing::{Document, Selection};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: std::ops::Range<usize>,
    },
    ReplaceRange {
        range: std::ops::Range<usize>,
        text: String,
    },
    /// Several replacements in one edit. Ascending and non-overlapping, in
    /// pre-edit offsets.
    Replace {
        changes: Vec<Change>,
    },
    Select {
        selection: Selection,
    },
}

impl Cmd {
    /// The command as a list of replacements clamped to `source`, with every
    /// offset snapped back to a char boundary.
    pub(crate) fn changes(&self, source: &str) -> Vec<Change> {
        let clamp = |range: &std::ops::Range<usize>| {
            let end = floor_char_boundary(source, range.end);
            floor_char_boundary(source, range.start.min(end))..end
        };
        match self {
            Cmd::InsertText { at, text } => {
                let at = floor_char_boundary(source, *at);
                vec![Change::insert(at, text.clone())]
            }
            Cmd::DeleteRange { range } => {
                let range = clamp(range);
                vec![Change::delete(range.start, range.end)]
            }
            Cmd::ReplaceRange { range, text } => {
                let range = clamp(range);
                vec![Change::new(range.start, range.end, text.clone())]
            }
            Cmd::Replace { changes } => changes
                .iter()
                .map(|change| {
                    let range = clamp(&(change.from..change.to));
                    Change::new(range.start, range.end, change.insert.clone())
                })
                .collect(),
            Cmd::Select { .. } => Vec::new(),
        }
    }
}

/// Compile a command into a delta
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Delta<RopeInfo> {
    let mut builder = Builder::new(doc.len());
    for change in cmd.changes(&doc.text()) {
        if change.insert.is_empty() {
            if change.from < change.to {
                builder.delete(change.from..change.to);
            }
        } else {
            builder.replace(change.from..change.to, Rope::from(change.insert));
        }
    }
    builder.build()
}

/// Transform selection based on the command being applied
pub(crate) fn transform_selection_for_command(
    doc: &Document,
    selection: &Selection,
    cmd: &Cmd,
) -> Selection {
    match cmd {
        Cmd::Select { selection: target } => target.clamp(doc.len()),
        _ => {
            let changes = cmd.changes(&doc.text());
            Selection::new(
                map_position(&changes, selection.anchor, true),
                map_position(&changes, selection.head, true),
            )
        }
    }
}
