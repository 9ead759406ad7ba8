//! The decoration pass.
//!
//! One pre-order walk over the syntax tree emits decorations per node, then
//! raw-text passes add `[toc]` widgets, math widgets, blockquote markers and
//! inline HTML styling. Inline constructs reveal on byte overlap with the
//! selection; block constructs reveal when the cursor line is one of theirs.
//!
//! Subtrees replaced by a widget (tables, rendered diagrams, images, `[toc]`)
//! are skipped, and anything a rendered math widget covers is dropped, so no
//! two replacing decorations claim the same bytes.

use std::sync::OnceLock;
use std::time::Instant;

use markdown_wysiwyg_config::{Config, DiagramSecurityLevel, Theme};
use regex::Regex;

use super::inline_html::{InlineHtmlMarker, append_inline_html_decorations, parse_inline_html_marker};
use super::math::scan_math;
use super::ranges::{DocRange, is_cursor_on_range_line, is_selection_in_range, overlaps_any, sort_ranges};
use super::{Attributes, Decoration, DecorationKind, DecorationSet, styles};
use crate::editing::Selection;
use crate::lines::{Line, LineIndex};
use crate::render::{CodeHighlighter, SyntectHighlighter};
use crate::syntax::{ListMarkerKind, NodeKind, SyntaxNode, SyntaxTree, Visit};
use crate::widgets::code_block::FencedBlock;
use crate::widgets::{
    DiagramWidget, ImageWidget, MathWidget, TableWidget, TaskCheckbox, TocHeading, TocWidget, Widget,
};

/// Everything one rebuild reads. Nothing here is mutated by the build.
pub struct BuildContext<'a> {
    pub text: &'a str,
    pub tree: &'a SyntaxTree,
    pub lines: &'a LineIndex,
    pub selection: Selection,
    pub highlighter: &'a dyn CodeHighlighter,
    pub theme: Theme,
    pub diagram_security_level: DiagramSecurityLevel,
}

impl<'a> BuildContext<'a> {
    pub fn new(text: &'a str, tree: &'a SyntaxTree, lines: &'a LineIndex, selection: Selection) -> Self {
        Self {
            text,
            tree,
            lines,
            selection: selection.clamp(text.len()),
            highlighter: SyntectHighlighter::shared(),
            theme: Theme::default(),
            diagram_security_level: DiagramSecurityLevel::default(),
        }
    }

    pub fn with_highlighter(mut self, highlighter: &'a dyn CodeHighlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn with_settings(mut self, config: &Config) -> Self {
        self.theme = config.theme;
        self.diagram_security_level = config.diagram_security_level;
        self
    }
}

fn image_regex() -> &'static Regex {
    static IMAGE: OnceLock<Regex> = OnceLock::new();
    IMAGE.get_or_init(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid image regex"))
}

fn task_regex() -> &'static Regex {
    static TASK: OnceLock<Regex> = OnceLock::new();
    TASK.get_or_init(|| Regex::new(r"^\[([ xX])\](?:\s|$)").expect("valid task regex"))
}

/// Build the full decoration set for the current text and selection.
pub fn build_decorations(cx: &BuildContext<'_>) -> DecorationSet {
    let started = Instant::now();
    let mut builder = Builder::new(cx);

    cx.tree.walk(|node| builder.visit(node));

    builder.add_toc_widgets();
    let math_spans = builder.add_math();
    builder.add_blockquote_markers();
    builder.add_inline_html(&math_spans);

    let set = DecorationSet::new(builder.decorations);
    log::debug!(
        "Built {} decorations ({} widgets, {} math spans) for {} bytes in {:?}",
        set.len(),
        set.widgets().count(),
        math_spans.len(),
        cx.text.len(),
        started.elapsed()
    );
    set
}

struct Builder<'c, 'a> {
    cx: &'c BuildContext<'a>,
    cursor_line: usize,
    decorations: Vec<Decoration>,
    /// Code blocks and spans; math and inline HTML never start inside them.
    code_ranges: Vec<DocRange>,
    table_ranges: Vec<DocRange>,
    /// Ranges owned by block widgets. Quote markers inside them stay untouched.
    block_widget_ranges: Vec<DocRange>,
    quote_ranges: Vec<DocRange>,
    html_markers: Vec<InlineHtmlMarker>,
    headings: Vec<TocHeading>,
    toc_ranges: Vec<DocRange>,
}

impl<'c, 'a> Builder<'c, 'a> {
    fn new(cx: &'c BuildContext<'a>) -> Self {
        Self {
            cx,
            cursor_line: cx.lines.line_at(cx.selection.head).number,
            decorations: Vec::new(),
            code_ranges: Vec::new(),
            table_ranges: Vec::new(),
            block_widget_ranges: Vec::new(),
            quote_ranges: Vec::new(),
            html_markers: Vec::new(),
            headings: Vec::new(),
            toc_ranges: Vec::new(),
        }
    }

    fn text(&self) -> &'a str {
        self.cx.text
    }

    fn reveal_inline(&self, from: usize, to: usize) -> bool {
        is_selection_in_range(&self.cx.selection, from, to)
    }

    fn reveal_block(&self, from: usize, to: usize) -> bool {
        self.reveal_inline(from, to) || is_cursor_on_range_line(self.cx.lines, self.cursor_line, from, to)
    }

    fn reveal_line(&self, line: Line) -> bool {
        line.number == self.cursor_line || self.reveal_inline(line.from, line.to)
    }

    fn visit(&mut self, node: SyntaxNode<'_>) -> Visit {
        match node.kind() {
            NodeKind::AtxHeading => self.atx_heading(node),
            NodeKind::SetextHeading => self.setext_heading(node),
            NodeKind::StrongEmphasis => self.inline_formatting(node, 2, styles::BOLD),
            NodeKind::Emphasis => self.inline_formatting(node, 1, styles::ITALIC),
            NodeKind::Strikethrough => {
                let tildes = leading_run(node.text(self.text()), b'~');
                self.inline_formatting(node, tildes, styles::STRIKETHROUGH);
            }
            NodeKind::CodeSpan => {
                self.code_ranges.push(node.range());
                let ticks = leading_run(node.text(self.text()), b'`');
                self.inline_formatting(node, ticks, styles::INLINE_CODE);
                return Visit::Skip;
            }
            NodeKind::InlineLink => self.link(node),
            NodeKind::Image => return self.image(node),
            NodeKind::ListItem => self.list_item(node),
            NodeKind::ThematicBreak => self.thematic_break(node),
            NodeKind::BlockQuote => {
                if !node.has_ancestor(NodeKind::BlockQuote) {
                    let source = node.text(self.text()).trim_end();
                    self.quote_ranges
                        .push(DocRange::new(node.from(), node.from() + source.len()));
                }
            }
            NodeKind::PipeTable => {
                self.table(node);
                return Visit::Skip;
            }
            NodeKind::FencedCodeBlock => {
                self.code_ranges.push(node.range());
                self.fenced_code(node);
                return Visit::Skip;
            }
            NodeKind::IndentedCodeBlock => {
                self.code_ranges.push(node.range());
                return Visit::Skip;
            }
            NodeKind::HtmlTag => {
                if let Some(marker) = parse_inline_html_marker(node.text(self.text()), node.from(), node.to()) {
                    self.html_markers.push(marker);
                }
                return Visit::Skip;
            }
            NodeKind::Paragraph => return self.paragraph(node),
            _ => {}
        }
        Visit::Children
    }

    fn atx_heading(&mut self, node: SyntaxNode<'_>) {
        let Some((marker, level)) = node.children().find_map(|child| match child.kind() {
            NodeKind::AtxMarker(level) => Some((child, level)),
            _ => None,
        }) else {
            return;
        };

        let content = node.child(NodeKind::Inline).map_or("", |inline| inline.text(self.text()));
        self.headings.push(TocHeading {
            from: node.from(),
            level,
            text: content.trim().trim_end_matches('#').trim_end().to_string(),
        });

        let line = self.cx.lines.line_at(node.from());
        if self.reveal_line(line) {
            return;
        }
        let hide_to = match self.text().as_bytes().get(marker.to()) {
            Some(b' ') | Some(b'\t') => marker.to() + 1,
            _ => marker.to(),
        };
        self.decorations.push(Decoration::hide(marker.from(), hide_to));
        self.decorations
            .push(Decoration::line(line.from, Attributes::style(styles::heading(level))));
    }

    fn setext_heading(&mut self, node: SyntaxNode<'_>) {
        let Some((underline, level)) = node.children().find_map(|child| match child.kind() {
            NodeKind::SetextUnderline(level) => Some((child, level)),
            _ => None,
        }) else {
            return;
        };

        let content = node
            .child(NodeKind::Paragraph)
            .map_or("", |paragraph| paragraph.text(self.text()));
        self.headings.push(TocHeading {
            from: node.from(),
            level,
            text: content.split_whitespace().collect::<Vec<_>>().join(" "),
        });

        if self.reveal_block(node.from(), underline.to()) {
            return;
        }
        let first_line = self.cx.lines.line_at(node.from());
        self.decorations
            .push(Decoration::line(first_line.from, Attributes::style(styles::heading(level))));
        self.decorations
            .push(Decoration::hide(underline.from(), underline.to()));
    }

    /// Symmetric markers around styled content: `**bold**`, `` `code` ``.
    fn inline_formatting(&mut self, node: SyntaxNode<'_>, marker_len: usize, style: &'static str) {
        let DocRange { from, to } = node.range();
        if marker_len == 0 || to < from + 2 * marker_len {
            return;
        }
        let content = DocRange::new(from + marker_len, to - marker_len);
        if !content.is_empty() {
            self.decorations
                .push(Decoration::mark(content.from, content.to, Attributes::style(style)));
        }
        self.push_markers(
            self.reveal_inline(from, to),
            [DocRange::new(from, content.from), DocRange::new(content.to, to)],
        );
    }

    fn push_markers(&mut self, revealed: bool, markers: [DocRange; 2]) {
        for marker in markers {
            if marker.is_empty() {
                continue;
            }
            self.decorations.push(if revealed {
                Decoration::dim(marker.from, marker.to)
            } else {
                Decoration::hide(marker.from, marker.to)
            });
        }
    }

    fn link(&mut self, node: SyntaxNode<'_>) {
        let DocRange { from, to } = node.range();
        let Some(label) = node.child(NodeKind::LinkText) else {
            return;
        };
        let raw = label.text(self.text());
        let inner_from = label.from() + usize::from(raw.starts_with('['));
        let inner_to = label.to() - usize::from(raw.len() > 1 && raw.ends_with(']'));
        if inner_from < from || inner_to < inner_from || inner_to > to {
            return;
        }

        if inner_from < inner_to {
            self.decorations
                .push(Decoration::mark(inner_from, inner_to, Attributes::style(styles::LINK_TEXT)));
        }
        self.push_markers(
            self.reveal_inline(from, to),
            [DocRange::new(from, inner_from), DocRange::new(inner_to, to)],
        );
    }

    fn image(&mut self, node: SyntaxNode<'_>) -> Visit {
        let DocRange { from, to } = node.range();
        if self.reveal_block(from, to) {
            return Visit::Children;
        }
        let Some(captures) = image_regex().captures(node.text(self.text())) else {
            return Visit::Children;
        };
        let alt = captures.get(1).map_or("", |m| m.as_str());
        let url = captures.get(2).map_or("", |m| m.as_str());
        self.decorations
            .push(Decoration::widget(from, to, Widget::Image(ImageWidget::new(url, alt))));
        Visit::Skip
    }

    fn list_item(&mut self, node: SyntaxNode<'_>) {
        let Some((marker, kind)) = node.children().find_map(|child| match child.kind() {
            NodeKind::ListMarker(kind) => Some((child, kind)),
            _ => None,
        }) else {
            return;
        };

        let line = self.cx.lines.line_at(marker.from());
        self.decorations
            .push(Decoration::line(line.from, Attributes::style(styles::LIST_LINE)));
        if self.reveal_line(line) {
            return;
        }

        let raw = marker.text(self.text());
        let marker_from = marker.from() + (raw.len() - raw.trim_start().len());
        let marker_to = marker.from() + raw.trim_end().len();
        if marker_from >= marker_to {
            return;
        }

        if let Some(task) = self.task_marker(marker_to, line) {
            let (checked, task_range, widget_to) = task;
            self.decorations.push(Decoration::widget(
                marker_from,
                widget_to,
                Widget::TaskCheckbox(TaskCheckbox::new(checked, task_range)),
            ));
            return;
        }

        match kind {
            ListMarkerKind::Bullet => self
                .decorations
                .push(Decoration::widget(marker_from, marker_to, Widget::Bullet)),
            ListMarkerKind::Ordered => self.decorations.push(Decoration::mark(
                marker_from,
                marker_to,
                Attributes::style(styles::ORDERED_MARKER),
            )),
        }
    }

    /// `[ ]` / `[x]` right after a list marker: `(checked, marker, widget end)`.
    fn task_marker(&self, after_marker: usize, line: Line) -> Option<(bool, DocRange, usize)> {
        let rest = self.text().get(after_marker..line.to)?;
        let start = after_marker + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
        let candidate = self.text().get(start..line.to)?;
        let captures = task_regex().captures(candidate)?;
        let checked = captures.get(1).is_some_and(|m| m.as_str() != " ");
        let task = DocRange::new(start, start + 3);
        let widget_to = match self.text().as_bytes().get(task.to) {
            Some(b' ') => task.to + 1,
            _ => task.to,
        };
        Some((checked, task, widget_to))
    }

    fn thematic_break(&mut self, node: SyntaxNode<'_>) {
        if self.reveal_block(node.from(), node.to()) {
            return;
        }
        let line = self.cx.lines.line_at(node.from());
        self.decorations
            .push(Decoration::line(line.from, Attributes::style(styles::HORIZONTAL_RULE_LINE)));
    }

    /// Tables always render as the editable widget.
    fn table(&mut self, node: SyntaxNode<'_>) {
        let source = node.text(self.text()).trim_end_matches(['\n', '\r']);
        if source.is_empty() {
            return;
        }
        let range = DocRange::new(node.from(), node.from() + source.len());
        self.table_ranges.push(range);
        self.block_widget_ranges.push(range);
        self.decorations.push(Decoration::widget(
            range.from,
            range.to,
            Widget::Table(TableWidget::new(source, range)),
        ));
    }

    fn fenced_code(&mut self, node: SyntaxNode<'_>) {
        let block = FencedBlock::from_node(node, self.text(), self.cx.lines);
        let code_text = block
            .code
            .and_then(|code| self.text().get(code.from..code.to))
            .unwrap_or("");
        let block_range = DocRange::new(block.open_line.from, block.close_line.to);

        if block.language == "mermaid" && !self.reveal_block(block_range.from, block_range.to) {
            self.block_widget_ranges.push(block_range);
            self.decorations.push(Decoration::widget(
                block_range.from,
                block_range.to,
                Widget::Diagram(DiagramWidget::new(code_text, self.cx.diagram_security_level)),
            ));
            return;
        }

        let delimiters: Vec<SyntaxNode<'_>> = node.children_of(NodeKind::FenceDelimiter).collect();
        if let Some(open) = delimiters.first() {
            self.decorations
                .push(Decoration::hide(open.from(), block.open_line.to));
            self.decorations.push(Decoration::line(
                block.open_line.from,
                Attributes::class(styles::CODE_FENCE_OPEN_CLASS),
            ));
            self.decorations.push(Decoration::widget(
                block.open_line.to,
                block.open_line.to,
                Widget::CodeBadge(block.badge()),
            ));
        }
        if let [_, .., close] = delimiters.as_slice() {
            self.decorations
                .push(Decoration::hide(close.from(), block.close_line.to));
            self.decorations.push(Decoration::line(
                block.close_line.from,
                Attributes::class(styles::CODE_FENCE_CLOSE_CLASS),
            ));
        }

        if let (Some(first), Some(last)) = (block.first_code_line, block.last_code_line) {
            for number in first.number..=last.number {
                let Some(line) = self.cx.lines.line(number) else {
                    continue;
                };
                self.decorations.push(Decoration::line(
                    line.from,
                    Attributes::class(styles::CODE_LINE_CLASS)
                        .with_data("data-line-number", (number - first.number + 1).to_string()),
                ));
            }
        }

        if let Some(code) = block.code {
            for token in self.cx.highlighter.highlight(code_text, &block.language) {
                if token.from >= token.to || token.to > code.len() {
                    continue;
                }
                self.decorations.push(Decoration::mark(
                    code.from + token.from,
                    code.from + token.to,
                    Attributes::style(format!("color: {};", token.kind.color(self.cx.theme))),
                ));
            }
        }
    }

    fn paragraph(&mut self, node: SyntaxNode<'_>) -> Visit {
        let source = node.text(self.text()).trim_end_matches(['\n', '\r']);
        if !source.trim().eq_ignore_ascii_case("[toc]") {
            return Visit::Children;
        }
        let range = DocRange::new(node.from(), node.from() + source.len());
        if self.reveal_block(range.from, range.to) {
            return Visit::Children;
        }
        self.toc_ranges.push(range);
        Visit::Skip
    }

    fn add_toc_widgets(&mut self) {
        for range in std::mem::take(&mut self.toc_ranges) {
            self.block_widget_ranges.push(range);
            self.decorations.push(Decoration::widget(
                range.from,
                range.to,
                Widget::Toc(TocWidget::new(self.headings.clone())),
            ));
        }
    }

    /// Math widgets for every unrevealed span. Returns all span ranges,
    /// revealed or not, for the inline HTML exclusion list.
    fn add_math(&mut self) -> Vec<DocRange> {
        let mut excluded: Vec<DocRange> = self
            .code_ranges
            .iter()
            .chain(self.table_ranges.iter())
            .copied()
            .collect();
        sort_ranges(&mut excluded);

        let scan = scan_math(self.text(), self.cx.lines, &self.cx.selection, &excluded);

        let mut rendered: Vec<DocRange> = scan
            .spans
            .iter()
            .filter(|span| !span.revealed)
            .map(|span| span.range)
            .collect();
        sort_ranges(&mut rendered);
        if !rendered.is_empty() {
            self.decorations.retain(|decoration| {
                matches!(decoration.kind, DecorationKind::Line(_))
                    || !overlaps_any(decoration.range(), &rendered)
            });
        }

        for span in scan.spans.iter().filter(|span| !span.revealed) {
            if span.display {
                self.block_widget_ranges.push(span.range);
            }
            self.decorations.push(Decoration::widget(
                span.range.from,
                span.range.to,
                Widget::Math(MathWidget::new(span.content.clone(), span.display)),
            ));
        }

        scan.spans.iter().map(|span| span.range).collect()
    }

    /// Hide `>` markers (dim them on the cursor line) and border every quoted line.
    fn add_blockquote_markers(&mut self) {
        sort_ranges(&mut self.block_widget_ranges);
        for quote in std::mem::take(&mut self.quote_ranges) {
            let first = self.cx.lines.line_at(quote.from).number;
            let last = self.cx.lines.line_at(quote.from.max(quote.to.saturating_sub(1))).number;
            for number in first..=last {
                let Some(line) = self.cx.lines.line(number) else {
                    continue;
                };
                self.decorations
                    .push(Decoration::line(line.from, Attributes::style(styles::BLOCKQUOTE_LINE)));

                let on_cursor_line = number == self.cursor_line;
                for marker in quote_markers(line.text(self.text()), line.from) {
                    if overlaps_any(marker, &self.block_widget_ranges) {
                        continue;
                    }
                    self.decorations.push(if on_cursor_line {
                        Decoration::dim(marker.from, marker.to)
                    } else {
                        Decoration::hide(marker.from, marker.to)
                    });
                }
            }
        }
    }

    fn add_inline_html(&mut self, math_spans: &[DocRange]) {
        if self.html_markers.is_empty() {
            return;
        }
        let excluded: Vec<DocRange> = self
            .code_ranges
            .iter()
            .chain(math_spans.iter())
            .copied()
            .collect();
        append_inline_html_decorations(
            &mut self.decorations,
            &self.cx.selection,
            &self.html_markers,
            &excluded,
        );
    }
}

fn leading_run(text: &str, byte: u8) -> usize {
    text.bytes().take_while(|b| *b == byte).count()
}

/// Each `>` at the start of a quoted line, with one following space.
fn quote_markers(line: &str, line_from: usize) -> Vec<DocRange> {
    let bytes = line.as_bytes();
    let mut markers = Vec::new();
    let mut pos = 0;
    loop {
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'>') {
            break;
        }
        let end = if bytes.get(pos + 1) == Some(&b' ') { pos + 2 } else { pos + 1 };
        markers.push(DocRange::new(line_from + pos, line_from + end));
        pos = end;
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn build(text: &str, cursor: usize) -> DecorationSet {
        let tree = syntax::parse(text);
        let lines = LineIndex::new(text);
        let cx = BuildContext::new(text, &tree, &lines, Selection::caret(cursor));
        build_decorations(&cx)
    }

    // ============ Inline formatting ============

    #[test]
    fn test_bold_markers_hidden_away_from_cursor() {
        let text = "**bold** text";
        assert_snapshot!(build(text, text.len()).to_string(), @r#"
        0..2 hide
        2..6 mark style="font-weight: 700;"
        6..8 hide
        "#);
    }

    #[test]
    fn test_bold_markers_dimmed_under_cursor() {
        assert_snapshot!(build("**bold** text", 3).to_string(), @r#"
        0..2 dim
        2..6 mark style="font-weight: 700;"
        6..8 dim
        "#);
    }

    // ============ Headings ============

    #[test]
    fn test_heading_hashes_hidden_off_cursor_line() {
        let text = "## Title\n\nbody";
        assert_snapshot!(build(text, text.len()).to_string(), @r#"
        0..0 line style="font-size: 1.5em; font-weight: 700; line-height: 1.3;"
        0..3 hide
        "#);
    }

    #[test]
    fn test_heading_revealed_on_cursor_line() {
        assert!(build("## Title\n\nbody", 4).is_empty());
    }

    // ============ Helpers ============

    #[test]
    fn test_quote_markers_nested() {
        assert_eq!(
            quote_markers("> > quoted", 10),
            vec![DocRange::new(10, 12), DocRange::new(12, 14)]
        );
        assert_eq!(quote_markers(">tight", 0), vec![DocRange::new(0, 1)]);
        assert!(quote_markers("plain", 0).is_empty());
    }

    #[test]
    fn test_leading_run() {
        assert_eq!(leading_run("``code``", b'`'), 2);
        assert_eq!(leading_run("~x~", b'~'), 1);
        assert_eq!(leading_run("x", b'~'), 0);
    }
}
