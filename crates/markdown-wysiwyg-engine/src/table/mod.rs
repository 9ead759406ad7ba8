//! # Table model
//!
//! Pipe tables as plain data. Text is parsed into a [`TableModel`], mutated
//! through pure functions and serialized back. Nothing is retained between
//! edits: every change round-trips through buffer text, so concurrent edits
//! to the table source are never overwritten with a stale grid.
//!
//! `TableModel::parse(&model.serialize()) == Some(model)` for any model whose
//! rows all have `headers.len()` cells.

pub mod model;
pub mod ops;

pub use model::{CellCoords, TableAlignment, TableModel, normalize_cell_value};
