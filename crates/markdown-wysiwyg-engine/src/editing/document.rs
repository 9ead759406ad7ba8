use tree_sitter::Tree;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::buffer::{
    Change, DispatchError, EditorBuffer, floor_char_boundary, normalize_changes,
};
use crate::editing::{Cmd, Patch, Selection};
use crate::lines::{Line, LineIndex};
use crate::syntax::{MarkdownParser, SyntaxTree};

/// The document being edited.
///
/// - **Source of truth**: one `xi_rope::Rope`. Saving writes its bytes
///   verbatim, so nothing is ever regenerated from a model.
/// - **Incremental parsing**: every edit is fed to the previous tree-sitter
///   block tree with `tree.edit()` before the delta touches the rope, then the
///   block tree is re-parsed and flattened into a fresh [`SyntaxTree`].
/// - **Commands**: all edits are [`Cmd`]s compiled to deltas. Widgets and
///   formatting commands go through [`EditorBuffer::dispatch`], which compiles
///   to [`Cmd::Replace`].
///
/// ```rust
/// # use markdown_wysiwyg_engine::editing::{Cmd, Document};
/// let mut doc = Document::from_bytes(b"# Hello\n\n- Item 1").unwrap();
/// let patch = doc.apply(Cmd::InsertText { at: 7, text: " there".to_string() });
///
/// assert_eq!(doc.text(), "# Hello there\n\n- Item 1");
/// assert_eq!(patch.version, doc.version());
/// ```
pub struct Document {
    pub(crate) buffer: Rope,
    pub(crate) selection: Selection,
    pub(crate) version: u64,
    parser: MarkdownParser,
    /// Block tree kept for incremental re-parsing
    block_tree: Option<Tree>,
    syntax: SyntaxTree,
    lines: LineIndex,
    /// Set while the host is mid-update; dispatches are refused with `Busy`
    updating: bool,
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        let buffer = Rope::from(text);
        let len = buffer.len();

        let mut parser = MarkdownParser::new()?;
        let block_tree = parser.parse_blocks(text, None)?;
        let syntax = parser.build(text, &block_tree);

        Ok(Self {
            buffer,
            selection: Selection::caret(len),
            version: 0,
            parser,
            block_tree: Some(block_tree),
            syntax,
            lines: LineIndex::new(text),
            updating: false,
        })
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_string().into_bytes()
    }

    /// Apply a command.
    ///
    /// `tree.edit()` must see the old buffer, so input edits are computed and
    /// fed to the block tree before the delta is applied to the rope.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let delta = self.compile_command(&cmd);

        let mut changed = Vec::new();
        let mut cursor = 0;
        for op in delta.els.iter() {
            match op {
                xi_rope::delta::DeltaElement::Copy(from, to) => {
                    cursor += to - from;
                }
                xi_rope::delta::DeltaElement::Insert(inserted) => {
                    let start = cursor;
                    let end = cursor + inserted.len();
                    changed.push(start..end);
                    cursor = end;
                }
            }
        }

        let new_selection = self.transform_selection_for_command(&self.selection, &cmd);

        if !delta.is_identity() {
            let old_tree = self.block_tree.take().map(|mut tree| {
                for edit in self.delta_to_input_edits(&delta) {
                    tree.edit(&edit);
                }
                tree
            });
            self.buffer = delta.apply(&self.buffer);
            self.reparse(old_tree.as_ref());
        }

        self.selection = new_selection;
        self.version += 1;

        Patch {
            changed,
            new_selection,
            version: self.version,
        }
    }

    fn reparse(&mut self, old_tree: Option<&Tree>) {
        let text = self.buffer.to_string();
        self.lines = LineIndex::new(&text);
        match self.parser.parse_blocks(&text, old_tree) {
            Ok(tree) => {
                self.syntax = self.parser.build(&text, &tree);
                self.block_tree = Some(tree);
            }
            Err(err) => {
                log::warn!("Re-parse failed, decorations fall back to raw text: {err}");
                self.syntax = SyntaxTree::empty(text.len());
                self.block_tree = None;
            }
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.len());
    }

    /// Block tree used for incremental parsing
    pub fn tree(&self) -> Option<&Tree> {
        self.block_tree.as_ref()
    }

    /// Flattened block and inline tree for the current text
    pub fn syntax(&self) -> &SyntaxTree {
        &self.syntax
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Mark the document as mid-update. Dispatches fail with
    /// [`DispatchError::Busy`] until cleared.
    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Slice the buffer, clamping the range to the document and snapping both
    /// ends back to char boundaries
    pub(crate) fn slice_to_cow(&self, range: std::ops::Range<usize>) -> std::borrow::Cow<'_, str> {
        let text = self.text();
        let end = floor_char_boundary(&text, range.end);
        let start = floor_char_boundary(&text, range.start.min(end));
        self.buffer.slice_to_cow(start..end)
    }

    pub(crate) fn compile_command(&self, cmd: &Cmd) -> Delta<RopeInfo> {
        crate::editing::commands::compile_command(self, cmd)
    }

    pub(crate) fn transform_selection_for_command(&self, selection: &Selection, cmd: &Cmd) -> Selection {
        crate::editing::commands::transform_selection_for_command(self, selection, cmd)
    }

    /// Convert an xi-rope delta to tree-sitter input edits in old-document
    /// coordinates.
    ///
    /// A deleted gap and the insertion at the same spot become one edit.
    /// Edits are returned last-first so each one's coordinates are still valid
    /// after the ones before it have been applied to the tree.
    fn delta_to_input_edits(&self, delta: &Delta<RopeInfo>) -> Vec<tree_sitter::InputEdit> {
        let old_text = self.buffer.to_string();
        let mut edits = Vec::new();
        let mut old_pos = 0;
        // (start, old_end, inserted text)
        let mut pending: Option<(usize, usize, String)> = None;

        for op in &delta.els {
            match op {
                xi_rope::delta::DeltaElement::Copy(from, to) => {
                    if old_pos < *from {
                        let entry = pending.get_or_insert((old_pos, old_pos, String::new()));
                        entry.1 = *from;
                    }
                    if let Some((start, old_end, inserted)) = pending.take() {
                        edits.push(input_edit(&old_text, start, old_end, &inserted));
                    }
                    old_pos = *to;
                }
                xi_rope::delta::DeltaElement::Insert(text) => {
                    let entry = pending.get_or_insert((old_pos, old_pos, String::new()));
                    entry.2.push_str(&text.to_string());
                }
            }
        }

        if old_pos < delta.base_len {
            let entry = pending.get_or_insert((old_pos, old_pos, String::new()));
            entry.1 = delta.base_len;
        }
        if let Some((start, old_end, inserted)) = pending.take() {
            edits.push(input_edit(&old_text, start, old_end, &inserted));
        }

        edits.reverse();
        edits
    }
}

fn input_edit(old_text: &str, start: usize, old_end: usize, inserted: &str) -> tree_sitter::InputEdit {
    let start_pos = byte_to_point_in_text(old_text, start);
    let old_end_pos = byte_to_point_in_text(old_text, old_end);
    let new_end_pos = match inserted.rfind('\n') {
        Some(last_newline) => (
            start_pos.0 + inserted.matches('\n').count(),
            inserted.len() - last_newline - 1,
        ),
        None => (start_pos.0, start_pos.1 + inserted.len()),
    };

    tree_sitter::InputEdit {
        start_byte: start,
        old_end_byte: old_end,
        new_end_byte: start + inserted.len(),
        start_position: point(start_pos),
        old_end_position: point(old_end_pos),
        new_end_position: point(new_end_pos),
    }
}

fn point((row, column): (usize, usize)) -> tree_sitter::Point {
    tree_sitter::Point { row, column }
}

/// Convert byte offset to (row, column) position in given text
fn byte_to_point_in_text(text: &str, byte_offset: usize) -> (usize, usize) {
    let text_bytes = text.as_bytes();
    let offset = byte_offset.min(text_bytes.len());

    let mut row = 0;
    let mut last_newline = 0;

    for (i, &byte) in text_bytes.iter().enumerate().take(offset) {
        if byte == b'\n' {
            row += 1;
            last_newline = i + 1;
        }
    }

    (row, offset - last_newline)
}

impl EditorBuffer for Document {
    fn text(&self) -> String {
        Document::text(self)
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn dispatch(
        &mut self,
        changes: Vec<Change>,
        selection: Option<Selection>,
    ) -> Result<Patch, DispatchError> {
        if self.updating {
            return Err(DispatchError::Busy);
        }
        let changes = normalize_changes(changes, &self.text())?;
        let mut patch = self.apply(Cmd::Replace { changes });
        if let Some(selection) = selection {
            self.selection = selection.clamp(self.buffer.len());
            patch.new_selection = self.selection;
        }
        Ok(patch)
    }

    fn line_at(&self, pos: usize) -> Line {
        self.lines.line_at(pos)
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.slice_to_cow(from..to).into_owned()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // Parser state and trees are derived from the buffer
        self.buffer.to_string() == other.buffer.to_string()
            && self.selection == other.selection
            && self.version == other.version
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.buffer.len())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .finish()
    }
}
