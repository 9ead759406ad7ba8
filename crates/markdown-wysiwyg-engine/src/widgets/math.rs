use serde::Serialize;

use super::{Element, RenderContext};

/// Rendered `$...$` (inline) or `$$` block (display) formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathWidget {
    pub content: String,
    pub display: bool,
}

impl MathWidget {
    pub fn new(content: impl Into<String>, display: bool) -> Self {
        Self {
            content: content.into(),
            display,
        }
    }

    pub fn render(&self, cx: &mut dyn RenderContext) -> Element {
        let html = cx.math_html(&self.content, self.display);
        if self.display {
            Element::new("div")
                .class("cm-block-math-widget")
                .style("text-align: center; padding: 12px 0;")
                .raw(html)
        } else {
            Element::new("span").class("cm-inline-math-widget").raw(html)
        }
    }
}
