//! Read-only HTML preview of a markdown document.
//!
//! Every top-level block is wrapped in `<div data-source-line="N">` with the
//! 1-based line the block starts on. Scroll sync pairs these tags with the
//! editor's line geometry.

use pulldown_cmark::{CowStr, Event, Options, Parser, html};

use crate::lines::LineIndex;

pub const SOURCE_LINE_ATTR: &str = "data-source-line";

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

fn open_block(line: usize) -> Event<'static> {
    Event::Html(CowStr::from(format!("<div {SOURCE_LINE_ATTR}=\"{line}\">")))
}

/// Render `text` to HTML with source-line tags on each top-level block.
pub fn render_preview_html(text: &str) -> String {
    let lines = LineIndex::new(text);
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut depth = 0usize;

    for (event, range) in Parser::new_ext(text, options()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    events.push(open_block(lines.line_at(range.start).number));
                }
                depth += 1;
                events.push(Event::Start(tag));
            }
            Event::End(tag) => {
                depth = depth.saturating_sub(1);
                events.push(Event::End(tag));
                if depth == 0 {
                    events.push(Event::Html(CowStr::Borrowed("</div>\n")));
                }
            }
            Event::Rule if depth == 0 => {
                events.push(open_block(lines.line_at(range.start).number));
                events.push(Event::Rule);
                events.push(Event::Html(CowStr::Borrowed("</div>\n")));
            }
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Every source line tagged in rendered preview HTML, in document order.
pub fn tagged_lines(html: &str) -> Vec<usize> {
    let needle = format!("{SOURCE_LINE_ATTR}=\"");
    html.match_indices(&needle)
        .filter_map(|(at, _)| {
            let rest = &html[at + needle.len()..];
            rest.split('"').next()?.parse().ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blocks_are_tagged_with_start_lines() {
        let html = render_preview_html("# Title\n\nSome text\nwrapped\n\n- a\n- b\n\n---\n");

        assert_eq!(tagged_lines(&html), vec![1, 3, 6, 9]);
        assert!(html.contains("<div data-source-line=\"1\"><h1>Title</h1>"));
        assert!(html.contains("<hr />"));
    }

    #[test]
    fn test_nested_blocks_are_not_tagged() {
        let html = render_preview_html("> quote\n>\n> - item\n");
        assert_eq!(tagged_lines(&html), vec![1]);
    }

    #[test]
    fn test_extensions_enabled() {
        let html = render_preview_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");

        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("type=\"checkbox\""));
        assert_eq!(tagged_lines(&html), vec![1, 5, 7]);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render_preview_html(""), "");
    }
}
