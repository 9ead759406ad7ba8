use serde::Serialize;

use super::Element;
use crate::editing::{DispatchError, EditorBuffer, Selection};

/// One entry of a `[toc]` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocHeading {
    /// Start of the heading in the buffer. Activating the entry puts the caret here.
    pub from: usize,
    pub level: u8,
    pub text: String,
}

/// Table of contents built from every ATX and setext heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocWidget {
    pub headings: Vec<TocHeading>,
    signature: String,
}

impl TocWidget {
    pub fn new(headings: Vec<TocHeading>) -> Self {
        let signature = headings
            .iter()
            .map(|heading| format!("{}:{}:{}", heading.from, heading.level, heading.text))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            headings,
            signature,
        }
    }

    /// Identity used to decide whether a mounted instance can be kept.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn render(&self) -> Element {
        let nav = Element::new("nav").class("markdown-toc cm-toc-widget");
        if self.headings.is_empty() {
            return nav.child(
                Element::new("div")
                    .class("toc-item")
                    .style("opacity: 0.6;")
                    .text("No headings found"),
            );
        }

        let min_level = self
            .headings
            .iter()
            .map(|heading| heading.level)
            .min()
            .unwrap_or(1);

        nav.children(self.headings.iter().enumerate().map(|(index, heading)| {
            let indent = usize::from(heading.level.saturating_sub(min_level)) * 16;
            Element::new("div")
                .class("toc-item")
                .style(format!("padding-left: {indent}px;"))
                .child(
                    Element::new("a")
                        .attr("href", "#")
                        .attr("data-toc-index", index.to_string())
                        .text(heading.text.clone()),
                )
        }))
    }

    /// Move the caret to entry `index` and focus the buffer. Unknown indexes
    /// and stale positions are ignored.
    pub fn activate<B: EditorBuffer + ?Sized>(
        &self,
        index: usize,
        buffer: &mut B,
    ) -> Result<bool, DispatchError> {
        let Some(heading) = self.headings.get(index) else {
            return Ok(false);
        };
        if heading.from > buffer.len() {
            log::warn!("Ignoring stale toc entry at {}", heading.from);
            return Ok(false);
        }
        buffer.dispatch(Vec::new(), Some(Selection::caret(heading.from)))?;
        buffer.focus();
        Ok(true)
    }
}
