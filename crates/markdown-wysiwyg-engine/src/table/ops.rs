//! Pure table mutations. Each returns a new model and clamps out-of-range
//! indices instead of failing.

use super::model::{CellCoords, TableAlignment, TableModel, normalize_cell_value};

impl TableModel {
    /// Set a cell. Row 0 addresses the header; invalid coordinates leave the
    /// model unchanged.
    pub fn set_cell_text(&self, coords: CellCoords, value: &str) -> TableModel {
        let mut next = self.clone();
        let value = normalize_cell_value(value);
        if coords.column >= next.headers.len() {
            return next;
        }

        if coords.row == 0 {
            next.headers[coords.column] = value;
        } else if let Some(row) = next.rows.get_mut(coords.row - 1) {
            row[coords.column] = value;
        }
        next
    }

    pub fn add_row_above(&self, body_row: usize) -> TableModel {
        self.insert_row(body_row)
    }

    pub fn add_row_below(&self, body_row: usize) -> TableModel {
        self.insert_row(body_row.saturating_add(1))
    }

    pub fn delete_row(&self, body_row: usize) -> TableModel {
        let mut next = self.clone();
        if next.rows.is_empty() {
            return next;
        }
        let index = body_row.min(next.rows.len() - 1);
        next.rows.remove(index);
        next
    }

    pub fn add_column_left(&self, column: usize) -> TableModel {
        self.insert_column(column)
    }

    pub fn add_column_right(&self, column: usize) -> TableModel {
        self.insert_column(column.saturating_add(1))
    }

    /// Remove a column. A single-column table is returned unchanged.
    pub fn delete_column(&self, column: usize) -> TableModel {
        let mut next = self.clone();
        if next.headers.len() <= 1 {
            return next;
        }
        let index = column.min(next.headers.len() - 1);
        next.headers.remove(index);
        next.alignments.remove(index);
        for row in &mut next.rows {
            if index < row.len() {
                row.remove(index);
            }
        }
        next
    }

    pub fn set_column_alignment(&self, column: usize, alignment: TableAlignment) -> TableModel {
        let mut next = self.clone();
        if next.alignments.is_empty() {
            return next;
        }
        let index = column.min(next.alignments.len() - 1);
        next.alignments[index] = alignment;
        next
    }

    /// Truncate or pad to the target size, keeping the top-left cells. Both
    /// dimensions are at least 1.
    pub fn resize(&self, body_rows: usize, columns: usize) -> TableModel {
        let mut next = self.clone();
        let columns = columns.max(1);
        let body_rows = body_rows.max(1);

        next.headers.resize(columns, String::new());
        next.alignments.resize(columns, TableAlignment::Left);
        for row in &mut next.rows {
            row.resize(columns, String::new());
        }
        next.rows.resize(body_rows, vec![String::new(); columns]);
        next
    }

    fn insert_row(&self, index: usize) -> TableModel {
        let mut next = self.clone();
        let index = index.min(next.rows.len());
        next.rows.insert(index, vec![String::new(); next.headers.len()]);
        next
    }

    fn insert_column(&self, index: usize) -> TableModel {
        let mut next = self.clone();
        let index = index.min(next.headers.len());
        next.headers.insert(index, String::new());
        next.alignments.insert(index, TableAlignment::Left);
        for row in &mut next.rows {
            let at = index.min(row.len());
            row.insert(at, String::new());
        }
        next
    }
}
