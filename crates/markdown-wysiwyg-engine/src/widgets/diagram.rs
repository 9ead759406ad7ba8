use markdown_wysiwyg_config::{DiagramSecurityLevel, Theme};
use serde::Serialize;

use super::{Element, RenderContext};
use crate::render::DiagramRequest;

pub const LOADING_TEXT: &str = "Rendering Mermaid diagram...";

/// A mermaid fence rendered as SVG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramWidget {
    pub code: String,
    pub security_level: DiagramSecurityLevel,
}

impl DiagramWidget {
    pub fn new(code: impl Into<String>, security_level: DiagramSecurityLevel) -> Self {
        Self {
            code: code.into(),
            security_level,
        }
    }

    pub fn request(&self, theme: Theme) -> DiagramRequest {
        DiagramRequest::new(self.code.clone(), theme, self.security_level)
    }

    /// Renders the cached SVG, or a loading panel while the render is pending.
    pub fn render(&self, cx: &mut dyn RenderContext) -> Element {
        let request = self.request(cx.theme());
        let panel = match cx.diagram_svg(&request) {
            Some(svg) => panel().raw(svg),
            None => panel().child(loading()),
        };
        wrapper(panel)
    }
}

pub(crate) fn wrapper(panel: Element) -> Element {
    Element::new("div")
        .class("cm-mermaid-widget")
        .style("padding: 8px 0;")
        .child(panel)
}

pub(crate) fn panel() -> Element {
    Element::new("div")
        .class("cm-mermaid-panel")
        .style("border-radius: 6px; padding: 8px; background: var(--c-wys-mermaid-panel-bg); overflow-x: auto;")
}

fn loading() -> Element {
    Element::new("div")
        .class("cm-mermaid-loading")
        .style("color: rgb(var(--c-wys-mermaid-loading-text) / 1); font-size: 0.8em; text-align: center; padding: 8px 0;")
        .text(LOADING_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::test_support::FakeContext;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pending_render_shows_loading_panel() {
        let mut cx = FakeContext::default();
        let widget = DiagramWidget::new("graph TD; A-->B", DiagramSecurityLevel::Strict);

        let element = widget.render(&mut cx);

        assert_eq!(element.text_content(), LOADING_TEXT);
        assert_eq!(cx.diagram_requests, vec![widget.request(Theme::Light)]);
    }

    #[test]
    fn test_cached_svg_is_injected() {
        let mut cx = FakeContext {
            svg: Some("<svg id=\"d\"></svg>".to_string()),
            ..FakeContext::default()
        };
        let widget = DiagramWidget::new("graph TD", DiagramSecurityLevel::Strict);

        let html = widget.render(&mut cx).to_html();

        assert!(html.contains("<svg id=\"d\"></svg>"));
        assert!(!html.contains(LOADING_TEXT));
    }
}
