//! WYSIWYG decoration engine for markdown.
//!
//! The buffer always holds plain markdown. A rebuild turns text plus
//! selection into a [`DecorationSet`]: markers to hide or dim, styled ranges,
//! line attributes, and widgets standing in for tables, checkboxes, math and
//! diagrams. Syntax under the cursor is revealed so it stays editable.

pub mod decorations;
pub mod editing;
pub mod lines;
pub mod preview;
pub mod render;
pub mod scroll;
pub mod session;
pub mod syntax;
pub mod table;
pub mod widgets;

pub use decorations::{BuildContext, Decoration, DecorationKind, DecorationSet, DocRange, build_decorations};
pub use editing::{Change, Cmd, DispatchError, Document, EditorBuffer, Patch, Selection};
pub use lines::{Line, LineIndex};
pub use preview::render_preview_html;
pub use scroll::ScrollSync;
pub use session::{EditorSession, PendingRender, SlotId};
pub use syntax::SyntaxTree;
pub use table::TableModel;
pub use widgets::Widget;
