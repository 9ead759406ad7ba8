/*!
 * # Widgets
 *
 * Opaque replacements for a decorated range. The set is closed:
 *
 * | widget | replaces | block |
 * |---|---|---|
 * | [`Widget::Bullet`] | a bullet list marker | no |
 * | [`Widget::TaskCheckbox`] | `- [ ] ` | no |
 * | [`Widget::Table`] | a whole pipe table | yes |
 * | [`Widget::CodeBadge`] | nothing, anchored on a hidden fence line | no |
 * | [`Widget::Toc`] | a `[toc]` paragraph | yes |
 * | [`Widget::Image`] | `![alt](url)` | no |
 * | [`Widget::Math`] | `$...$` or a `$$` block | display math only |
 * | [`Widget::Diagram`] | a mermaid fence | yes |
 *
 * Every variant answers the same four questions: how to describe itself,
 * how to render into an [`Element`], whether it is a block, and whether an
 * existing instance can be kept ([`Widget::same_as`]).
 *
 * Rendering that needs outside help (math markup, image paths, diagram SVG)
 * goes through [`RenderContext`], which the session implements on top of its
 * caches. Interactive widgets commit edits through
 * [`crate::editing::EditorBuffer`] like every other command.
 */

pub mod bullet;
pub mod code_block;
pub mod diagram;
pub mod element;
pub mod image;
pub mod math;
pub mod table;
pub mod task;
pub mod toc;

use markdown_wysiwyg_config::Theme;
use serde::Serialize;

use crate::render::DiagramRequest;

pub use code_block::CodeBadge;
pub use diagram::DiagramWidget;
pub use element::{Element, Node};
pub use image::ImageWidget;
pub use math::MathWidget;
pub use table::TableWidget;
pub use task::TaskCheckbox;
pub use toc::{TocHeading, TocWidget};

/// Services a widget may call while rendering.
pub trait RenderContext {
    /// Sanitized markup for a formula. Never fails; errors render as source.
    fn math_html(&mut self, content: &str, display: bool) -> String;

    /// Display URL for an image reference.
    fn image_src(&self, url: &str) -> String;

    /// Cached SVG for a diagram, or `None` after scheduling a render.
    fn diagram_svg(&mut self, request: &DiagramRequest) -> Option<String>;

    fn theme(&self) -> Theme;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Widget {
    Bullet,
    TaskCheckbox(TaskCheckbox),
    Table(TableWidget),
    CodeBadge(CodeBadge),
    Toc(TocWidget),
    Image(ImageWidget),
    Math(MathWidget),
    Diagram(DiagramWidget),
}

impl Widget {
    /// Short label used by decoration dumps.
    pub fn describe(&self) -> String {
        match self {
            Widget::Bullet => "bullet".to_string(),
            Widget::TaskCheckbox(task) => {
                format!("task checked={} marker={}..{}", task.checked, task.marker.from, task.marker.to)
            }
            Widget::Table(table) => format!("table {}x{}", table.body_rows(), table.columns()),
            Widget::CodeBadge(badge) => format!("code-badge {:?}", badge.language),
            Widget::Toc(toc) => format!("toc {:?}", toc.signature()),
            Widget::Image(image) => format!("image {:?} alt={:?}", image.url, image.alt),
            Widget::Math(math) => {
                let mode = if math.display { "block" } else { "inline" };
                format!("math {mode} {:?}", math.content)
            }
            Widget::Diagram(diagram) => format!("diagram {:?}", diagram.code),
        }
    }

    pub fn is_block(&self) -> bool {
        match self {
            Widget::Table(_) | Widget::Toc(_) | Widget::Diagram(_) => true,
            Widget::Math(math) => math.display,
            Widget::Bullet
            | Widget::TaskCheckbox(_)
            | Widget::CodeBadge(_)
            | Widget::Image(_) => false,
        }
    }

    /// Whether a rendered instance of `self` can stand in for `other`.
    pub fn same_as(&self, other: &Widget) -> bool {
        match (self, other) {
            (Widget::Toc(a), Widget::Toc(b)) => a.signature() == b.signature(),
            _ => self == other,
        }
    }

    pub fn render(&self, cx: &mut dyn RenderContext) -> Element {
        match self {
            Widget::Bullet => bullet::render(),
            Widget::TaskCheckbox(task) => task.render(),
            Widget::Table(table) => table.render(),
            Widget::CodeBadge(badge) => badge.render(),
            Widget::Toc(toc) => toc.render(),
            Widget::Image(image) => image.render(cx),
            Widget::Math(math) => math.render(cx),
            Widget::Diagram(diagram) => diagram.render(cx),
        }
    }
}
