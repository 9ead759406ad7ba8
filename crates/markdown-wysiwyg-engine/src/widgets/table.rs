//! Editable table widget.
//!
//! [`TableWidget`] is the decoration payload: the table source and its range.
//! [`TableEditor`] is the per-mount commit state a host keeps next to the
//! rendered grid. Every commit re-reads the table from the buffer, overlays
//! values still sitting in the rendered cells, applies one [`TableAction`] and
//! replaces the whole range, so concurrent edits to the source are never
//! clobbered with a stale grid.

use serde::Serialize;

use super::Element;
use crate::decorations::DocRange;
use crate::editing::{Change, DispatchError, EditorBuffer};
use crate::table::{CellCoords, TableAlignment, TableModel, normalize_cell_value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableWidget {
    pub text: String,
    pub range: DocRange,
}

impl TableWidget {
    pub fn new(text: impl Into<String>, range: DocRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    pub fn model(&self) -> Option<TableModel> {
        TableModel::parse(&self.text)
    }

    pub fn columns(&self) -> usize {
        self.model().map_or(0, |model| model.column_count())
    }

    pub fn body_rows(&self) -> usize {
        self.model().map_or(0, |model| model.body_row_count())
    }

    pub fn render(&self) -> Element {
        let wrapper = Element::new("div")
            .class("cm-table-widget")
            .style("padding: 8px 0; overflow-x: auto;")
            .attr("data-table-from", self.range.from.to_string())
            .attr("data-table-to", self.range.to.to_string());

        let Some(model) = self.model() else {
            return wrapper.text(self.text.clone());
        };

        let header_row = Element::new("tr").children(model.headers.iter().enumerate().map(
            |(column, header)| cell("th", header, CellCoords::new(0, column), model.alignments[column]),
        ));

        let body_rows = model.rows.iter().enumerate().map(|(index, row)| {
            let mut tr = Element::new("tr");
            if index % 2 == 0 {
                tr = tr.style("background: var(--c-wys-table-row-alt-bg);");
            }
            tr.children(row.iter().enumerate().map(|(column, value)| {
                cell("td", value, CellCoords::new(index + 1, column), model.alignments[column])
            }))
        });

        wrapper.child(controls()).child(
            Element::new("table")
                .style("border-collapse: collapse; width: 100%; font-size: 0.9em;")
                .child(Element::new("thead").child(header_row))
                .child(Element::new("tbody").children(body_rows)),
        )
    }
}

fn cell(tag: &'static str, value: &str, coords: CellCoords, alignment: TableAlignment) -> Element {
    let align = match alignment {
        TableAlignment::Left => "left",
        TableAlignment::Center => "center",
        TableAlignment::Right => "right",
    };
    let head = if tag == "th" {
        " font-weight: 600; background: var(--c-wys-table-head-bg);"
    } else {
        ""
    };
    Element::new(tag)
        .attr("contenteditable", "true")
        .attr("spellcheck", "false")
        .attr("data-row", coords.row.to_string())
        .attr("data-col", coords.column.to_string())
        .style(format!(
            "border: 1px solid rgb(var(--c-wys-table-border) / 1); padding: 6px 12px; text-align: {align};{head}"
        ))
        .text(value)
}

fn controls() -> Element {
    const ACTIONS: &[(&str, &str)] = &[
        ("add-row-above", "Row above"),
        ("add-row-below", "Row below"),
        ("delete-row", "Delete row"),
        ("add-column-left", "Column left"),
        ("add-column-right", "Column right"),
        ("delete-column", "Delete column"),
        ("align-left", "Align left"),
        ("align-center", "Align center"),
        ("align-right", "Align right"),
    ];
    Element::new("div")
        .class("cm-table-controls")
        .children(ACTIONS.iter().map(|(action, label)| {
            Element::new("button")
                .attr("type", "button")
                .attr("data-action", *action)
                .text(*label)
        }))
}

/// One mutation requested from the widget. Row indexes count body rows from 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    SetCell { coords: CellCoords, value: String },
    AddRowAbove(usize),
    AddRowBelow(usize),
    DeleteRow(usize),
    AddColumnLeft(usize),
    AddColumnRight(usize),
    DeleteColumn(usize),
    SetAlignment { column: usize, alignment: TableAlignment },
    Resize { rows: usize, columns: usize },
}

impl TableAction {
    pub fn apply(&self, model: &TableModel) -> TableModel {
        match self {
            TableAction::SetCell { coords, value } => model.set_cell_text(*coords, value),
            TableAction::AddRowAbove(row) => model.add_row_above(*row),
            TableAction::AddRowBelow(row) => model.add_row_below(*row),
            TableAction::DeleteRow(row) => model.delete_row(*row),
            TableAction::AddColumnLeft(column) => model.add_column_left(*column),
            TableAction::AddColumnRight(column) => model.add_column_right(*column),
            TableAction::DeleteColumn(column) => model.delete_column(*column),
            TableAction::SetAlignment { column, alignment } => {
                model.set_column_alignment(*column, *alignment)
            }
            TableAction::Resize { rows, columns } => model.resize(*rows, *columns),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing to write: the serialized table equals the buffer text.
    Unchanged,
    Dispatched,
    /// The buffer was busy. Call [`TableEditor::run_deferred`] on the next frame.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKey {
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// An uncommitted cell draft would be lost, so the shortcut does nothing.
    Suppressed,
    /// Sent to the buffer's history. `applied` is what the buffer reported.
    Forwarded { applied: bool },
}

#[derive(Debug, Clone)]
struct DeferredCommit {
    action: TableAction,
    live: Option<Vec<Vec<String>>>,
}

/// Commit state for one mounted table.
#[derive(Debug, Clone)]
pub struct TableEditor {
    range: DocRange,
    committed: String,
    draft: Option<(CellCoords, String)>,
    deferred: Option<DeferredCommit>,
}

impl TableEditor {
    pub fn new(widget: &TableWidget) -> Self {
        Self {
            range: widget.range,
            committed: widget.text.clone(),
            draft: None,
            deferred: None,
        }
    }

    /// Adopt a rebuilt decoration for the same table. The draft survives.
    pub fn sync(&mut self, widget: &TableWidget) {
        self.range = widget.range;
        self.committed = widget.text.clone();
    }

    pub fn range(&self) -> DocRange {
        self.range
    }

    pub fn committed_text(&self) -> &str {
        &self.committed
    }

    /// Record text typed into a cell but not yet committed.
    pub fn edit_draft(&mut self, coords: CellCoords, text: impl Into<String>) {
        self.draft = Some((coords, text.into()));
    }

    /// Drop the draft (Escape). Returns the committed value to restore.
    pub fn cancel_draft(&mut self) -> Option<String> {
        let (coords, _) = self.draft.take()?;
        TableModel::parse(&self.committed)
            .and_then(|model| model.cell(coords).map(str::to_string))
    }

    pub fn has_uncommitted_draft(&self) -> bool {
        let Some((coords, text)) = &self.draft else {
            return false;
        };
        let committed = TableModel::parse(&self.committed)
            .and_then(|model| model.cell(*coords).map(str::to_string));
        committed.as_deref() != Some(normalize_cell_value(text).as_str())
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Commit the current draft (Enter or blur).
    pub fn commit_draft<B: EditorBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
    ) -> Result<CommitOutcome, DispatchError> {
        let Some((coords, value)) = self.draft.clone() else {
            return Ok(CommitOutcome::Unchanged);
        };
        self.commit(buffer, TableAction::SetCell { coords, value }, None)
    }

    /// Apply `action` on top of the buffer's current table text. `live` is
    /// the grid as currently shown, header row first.
    pub fn commit<B: EditorBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        action: TableAction,
        live: Option<&[Vec<String>]>,
    ) -> Result<CommitOutcome, DispatchError> {
        match self.try_commit(buffer, &action, live) {
            Err(DispatchError::Busy) => {
                log::debug!("Buffer busy, deferring table commit at {}", self.range.from);
                self.deferred = Some(DeferredCommit {
                    action,
                    live: live.map(<[Vec<String>]>::to_vec),
                });
                Ok(CommitOutcome::Deferred)
            }
            other => other,
        }
    }

    /// The single retry of a deferred commit. A second failure propagates.
    pub fn run_deferred<B: EditorBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
    ) -> Result<CommitOutcome, DispatchError> {
        let Some(deferred) = self.deferred.take() else {
            return Ok(CommitOutcome::Unchanged);
        };
        self.try_commit(buffer, &deferred.action, deferred.live.as_deref())
    }

    pub fn handle_history_key<B: EditorBuffer + ?Sized>(
        &mut self,
        key: HistoryKey,
        buffer: &mut B,
    ) -> HistoryOutcome {
        if self.has_uncommitted_draft() {
            return HistoryOutcome::Suppressed;
        }
        let applied = match key {
            HistoryKey::Undo => buffer.undo(),
            HistoryKey::Redo => buffer.redo(),
        };
        HistoryOutcome::Forwarded { applied }
    }

    fn try_commit<B: EditorBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        action: &TableAction,
        live: Option<&[Vec<String>]>,
    ) -> Result<CommitOutcome, DispatchError> {
        let DocRange { from, to } = self.range;
        if from >= to || to > buffer.len() {
            log::warn!("Ignoring table commit with stale range {from}..{to}");
            return Ok(CommitOutcome::Unchanged);
        }

        let current = buffer.slice(from, to);
        let Some(mut model) = TableModel::parse(&current) else {
            return Ok(CommitOutcome::Unchanged);
        };
        if let Some(live) = live {
            model = overlay_live_cells(model, live);
        }

        let next = action.apply(&model).serialize();
        if next == current {
            self.committed = current;
            self.clear_draft_for(action);
            return Ok(CommitOutcome::Unchanged);
        }

        match buffer.dispatch(vec![Change::new(from, to, next.clone())], None) {
            Ok(_) => {}
            Err(DispatchError::Misaligned { .. }) => {
                log::warn!("Ignoring table commit with range {from}..{to} inside a character");
                return Ok(CommitOutcome::Unchanged);
            }
            Err(e) => return Err(e),
        }
        self.range = DocRange::new(from, from + next.len());
        self.committed = next;
        self.clear_draft_for(action);
        Ok(CommitOutcome::Dispatched)
    }

    fn clear_draft_for(&mut self, action: &TableAction) {
        if let TableAction::SetCell { coords, .. } = action {
            if self.draft.as_ref().is_some_and(|(draft, _)| draft == coords) {
                self.draft = None;
            }
        }
    }
}

fn overlay_live_cells(model: TableModel, live: &[Vec<String>]) -> TableModel {
    let mut model = model;
    for (row, cells) in live.iter().enumerate() {
        for (column, value) in cells.iter().enumerate() {
            let coords = CellCoords::new(row, column);
            if model.cell(coords).is_some() {
                model = model.set_cell_text(coords, value);
            }
        }
    }
    model
}
