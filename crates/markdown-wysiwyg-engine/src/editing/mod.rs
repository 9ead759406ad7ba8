/*!
 * # Editing
 *
 * ## Single source of truth
 * - The document lives in one **`xi_rope::Rope`** buffer, saved verbatim
 * - Every edit is a [`Cmd`] compiled to an xi-rope **Delta**
 * - The tree-sitter block tree is edited with `tree.edit()` before each delta
 *   is applied, then re-parsed incrementally
 *
 * ## One dispatch path
 * Widgets, formatting commands and list commands never touch the rope
 * directly. They compute [`Change`]s and call [`EditorBuffer::dispatch`],
 * which clamps stale offsets and rejects overlapping change lists. A host
 * embedding its own text buffer implements [`EditorBuffer`] and gets the same
 * widgets and commands.
 *
 * ## Module Structure
 *
 * - **`buffer`**: `Selection`, `Change`, `EditorBuffer`, `DispatchError`
 * - **`document`**: `Document`, rope + incremental parse
 * - **`commands`**: `Cmd` and delta compilation
 * - **`patch`**: edit result metadata
 * - **`lists`**: ordered-list indent/outdent with renumbering
 * - **`format`**: wrap/unwrap and line-prefix toolbar commands
 *
 * ```rust
 * use markdown_wysiwyg_engine::editing::*;
 *
 * let mut doc = Document::from_bytes(b"1. one\n2. two").unwrap();
 * doc.set_selection(Selection::caret(8));
 *
 * assert!(lists::indent_ordered_list_item(&mut doc));
 * assert_eq!(doc.text(), "1. one\n   1. two");
 * ```
 */

pub mod buffer;
pub mod commands;
pub mod document;
pub mod format;
pub mod lists;
pub mod patch;

pub use buffer::{Change, DispatchError, EditorBuffer, Selection};
pub use commands::Cmd;
pub use document::Document;
pub use patch::Patch;
