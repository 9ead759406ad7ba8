//! Terminal rendering of a decorated document.
//!
//! Hidden ranges are dropped, marks become text modifiers and widgets are drawn
//! as glyphs. Block widgets that span several source lines take the place of
//! all of them.

use markdown_wysiwyg_engine::decorations::{Attributes, styles};
use markdown_wysiwyg_engine::lines::{Line as SourceLine, LineIndex};
use markdown_wysiwyg_engine::table::CellCoords;
use markdown_wysiwyg_engine::{Decoration, DecorationKind, DecorationSet, Widget};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Rendered rows plus the row showing the cursor line.
pub struct Rendered {
    pub rows: Vec<Line<'static>>,
    pub cursor_row: usize,
}

pub fn render_document(
    text: &str,
    lines: &LineIndex,
    set: &DecorationSet,
    cursor_line: usize,
) -> Rendered {
    let mut rows = Vec::new();
    let mut cursor_row = 0;

    for line in lines.lines() {
        if is_swallowed(line, set) {
            continue;
        }
        if line.number <= cursor_line {
            cursor_row = rows.len();
        }
        let mut rendered = render_line(text, line, set);
        if line.number == cursor_line {
            for row in &mut rendered {
                row.style = row.style.bg(Color::Rgb(40, 40, 48));
            }
        }
        rows.extend(rendered);
    }

    Rendered { rows, cursor_row }
}

/// A line that contributes nothing of its own: covered by a widget that started
/// on an earlier line, or hidden from end to end.
fn is_swallowed(line: SourceLine, set: &DecorationSet) -> bool {
    let continued = set.iter().any(|d| match &d.kind {
        DecorationKind::Widget(_) => d.from < line.from && d.to >= line.to,
        _ => false,
    });
    let hidden = !line.is_empty()
        && set
            .iter()
            .any(|d| d.kind == DecorationKind::Hide && d.from <= line.from && d.to >= line.to);
    // A fence line keeps its row when a badge is inserted into it.
    let inserts = set.iter().any(|d| {
        matches!(d.kind, DecorationKind::Widget(_))
            && d.from == d.to
            && (line.from..=line.to).contains(&d.from)
    });
    continued || (hidden && !inserts)
}

fn touching(line: SourceLine, set: &DecorationSet) -> Vec<&Decoration> {
    set.iter()
        .filter(|d| d.from <= line.to && d.to >= line.from)
        .filter(|d| !matches!(d.kind, DecorationKind::Line(_)))
        .collect()
}

fn render_line(text: &str, line: SourceLine, set: &DecorationSet) -> Vec<Line<'static>> {
    let base = line_style(set.line_attributes(line.from));
    if set
        .line_attributes(line.from)
        .any(|a| a.style.as_deref() == Some(styles::HORIZONTAL_RULE_LINE))
    {
        return vec![Line::styled("─".repeat(40), Style::default().fg(Color::DarkGray))];
    }

    let decorations = touching(line, set);
    let mut cuts = vec![line.from, line.to];
    for d in &decorations {
        cuts.push(d.from.clamp(line.from, line.to));
        cuts.push(d.to.clamp(line.from, line.to));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut spans = Vec::new();
    let mut extra_rows = Vec::new();
    if is_quote_line(set, line) {
        spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
    }

    for (i, &at) in cuts.iter().enumerate() {
        for d in decorations.iter().filter(|d| d.from == at && d.to == at) {
            if let DecorationKind::Widget(widget) = &d.kind {
                spans.push(widget_span(widget));
            }
        }
        let Some(&end) = cuts.get(i + 1) else {
            break;
        };

        let covering = decorations
            .iter()
            .find(|d| d.kind.is_replacing() && d.from < d.to && d.from <= at && d.to >= end);
        match covering.map(|d| (&d.kind, d.from)) {
            Some((DecorationKind::Widget(widget), from)) => {
                // Draw once, at the first segment of the widget.
                if at == from.max(line.from) {
                    spans.push(widget_span(widget));
                    extra_rows.extend(widget_rows(widget));
                }
            }
            Some(_) => {}
            None => {
                let Some(slice) = text.get(at..end) else {
                    continue;
                };
                let style = decorations
                    .iter()
                    .filter(|d| d.from <= at && d.to >= end && d.from < d.to)
                    .fold(base, |style, d| style.patch(span_style(&d.kind)));
                spans.push(Span::styled(slice.to_string(), style));
            }
        }
    }

    if !extra_rows.is_empty() && spans.iter().all(|span| span.content.is_empty()) {
        return extra_rows;
    }
    let mut rows = vec![Line::from(spans).style(base)];
    rows.extend(extra_rows);
    rows
}

fn is_quote_line(set: &DecorationSet, line: SourceLine) -> bool {
    set.line_attributes(line.from)
        .any(|a| a.style.as_deref() == Some(styles::BLOCKQUOTE_LINE))
}

fn line_style<'a>(attributes: impl Iterator<Item = &'a Attributes>) -> Style {
    attributes.fold(Style::default(), |style, attributes| {
        let css = attributes.style.as_deref().unwrap_or("");
        let class = attributes.class.as_deref().unwrap_or("");
        if css.contains("font-size") {
            style.fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if css == styles::BLOCKQUOTE_LINE {
            style.add_modifier(Modifier::ITALIC)
        } else if class == styles::CODE_LINE_CLASS {
            style.fg(Color::Green)
        } else {
            style
        }
    })
}

fn span_style(kind: &DecorationKind) -> Style {
    match kind {
        DecorationKind::Dim => Style::default().fg(Color::DarkGray),
        DecorationKind::Mark(attributes) => css_style(attributes.style.as_deref().unwrap_or("")),
        _ => Style::default(),
    }
}

fn css_style(css: &str) -> Style {
    let mut style = Style::default();
    if css.contains("font-weight: 700") || css.contains("font-weight: 600") {
        style = style.add_modifier(Modifier::BOLD);
    }
    if css.contains("font-style: italic") {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if css.contains("line-through") {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if css.contains("text-decoration: underline") {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if css.contains("monospace") {
        style = style.fg(Color::LightRed);
    } else if css == styles::LINK_TEXT {
        style = style.fg(Color::LightBlue);
    } else if css.starts_with("color:") {
        style = style.fg(Color::Cyan);
    }
    style
}

fn widget_span(widget: &Widget) -> Span<'static> {
    let accent = Style::default().fg(Color::Cyan);
    match widget {
        Widget::Bullet => Span::styled("•", accent),
        Widget::TaskCheckbox(task) if task.checked => Span::styled("☑ ", accent),
        Widget::TaskCheckbox(_) => Span::styled("☐ ", accent),
        Widget::CodeBadge(badge) => Span::styled(
            format!("  [{}]", badge.language),
            Style::default().fg(Color::DarkGray),
        ),
        Widget::Image(image) => Span::styled(format!("🖼 {}", image.alt), accent),
        Widget::Math(math) if math.display => Span::styled(
            format!("∑ {}", math.content.trim()),
            Style::default().fg(Color::Magenta),
        ),
        Widget::Math(math) => Span::styled(math.content.clone(), Style::default().fg(Color::Magenta)),
        Widget::Diagram(_) => Span::styled("◇ mermaid diagram", accent),
        Widget::Toc(_) => Span::styled("Contents", accent.add_modifier(Modifier::BOLD)),
        Widget::Table(_) => Span::raw(""),
    }
}

/// Rows drawn under a block widget's first row.
fn widget_rows(widget: &Widget) -> Vec<Line<'static>> {
    match widget {
        Widget::Toc(toc) => toc
            .headings
            .iter()
            .map(|heading| {
                let indent = "  ".repeat(usize::from(heading.level.saturating_sub(1)));
                Line::from(format!("  {indent}{}", heading.text))
            })
            .collect(),
        Widget::Table(table) => {
            let Some(model) = table.model() else {
                return vec![Line::from(table.text.clone())];
            };
            (0..=model.body_row_count())
                .map(|row| {
                    let cells: Vec<&str> = (0..model.column_count())
                        .map(|column| model.cell(CellCoords::new(row, column)).unwrap_or(""))
                        .collect();
                    let style = if row == 0 {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Line::styled(format!("│ {} │", cells.join(" │ ")), style)
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_wysiwyg_engine::{BuildContext, Selection, build_decorations, syntax};
    use pretty_assertions::assert_eq;

    fn rows(text: &str, cursor: usize) -> Vec<String> {
        let tree = syntax::parse(text);
        let lines = LineIndex::new(text);
        let set = build_decorations(&BuildContext::new(text, &tree, &lines, Selection::caret(cursor)));
        let cursor_line = lines.line_at(cursor).number;
        render_document(text, &lines, &set, cursor_line)
            .rows
            .iter()
            .map(|row| row.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    // ============ Inline ============

    #[test]
    fn test_markers_hidden_off_cursor_line() {
        assert_eq!(rows("**bold** text\n\nend", 17), vec!["bold text", "", "end"]);
    }

    #[test]
    fn test_cursor_line_shows_source() {
        assert_eq!(rows("**bold** text\n\nend", 3)[0], "**bold** text");
    }

    // ============ Lists ============

    #[test]
    fn test_bullets_and_tasks_become_glyphs() {
        let text = "- one\n- [x] done\n\nend";
        assert_eq!(rows(text, text.len()), vec!["• one", "☑ done", "", "end"]);
    }

    // ============ Blocks ============

    #[test]
    fn test_table_rows_replace_source() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\n\nafter";
        assert_eq!(
            rows(text, text.len()),
            vec!["│ a │ b │", "│ 1 │ 2 │", "", "after"]
        );
    }

    #[test]
    fn test_fence_lines_collapse_to_badge() {
        let text = "```rust\nlet x = 1;\n```\n\nafter";
        assert_eq!(
            rows(text, text.len()),
            vec!["  [rust]", "let x = 1;", "", "after"]
        );
    }

    #[test]
    fn test_cursor_row_tracks_swallowed_lines() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\n\nafter";
        let tree = syntax::parse(text);
        let lines = LineIndex::new(text);
        let set = build_decorations(&BuildContext::new(text, &tree, &lines, Selection::caret(text.len())));

        let rendered = render_document(text, &lines, &set, 5);
        assert_eq!(rendered.cursor_row, 3);
    }
}
