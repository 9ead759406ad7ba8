use serde::Serialize;

use super::{Element, RenderContext};

/// Inline image. The `src` is resolved at render time so a change of active
/// document re-resolves relative paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageWidget {
    pub url: String,
    pub alt: String,
}

impl ImageWidget {
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
        }
    }

    /// Hosts report `load` and `error` of the image through
    /// `EditorSession::request_measure`, since the size is unknown until then.
    pub fn render(&self, cx: &mut dyn RenderContext) -> Element {
        Element::new("span")
            .class("cm-image-widget")
            .style("display: inline-block; max-width: 100%; padding: 4px 0;")
            .child(
                Element::new("img")
                    .attr("src", cx.image_src(&self.url))
                    .attr("alt", self.alt.clone())
                    .style("display: block; max-width: 100%; border-radius: 4px;"),
            )
    }
}
