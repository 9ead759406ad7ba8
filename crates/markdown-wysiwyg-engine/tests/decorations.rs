use markdown_wysiwyg_engine::decorations::styles;
use markdown_wysiwyg_engine::lines::LineIndex;
use markdown_wysiwyg_engine::widgets::Widget;
use markdown_wysiwyg_engine::{
    BuildContext, DecorationKind, DecorationSet, Selection, build_decorations, syntax,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn build(text: &str, cursor: usize) -> DecorationSet {
    let tree = syntax::parse(text);
    let lines = LineIndex::new(text);
    build_decorations(&BuildContext::new(text, &tree, &lines, Selection::caret(cursor)))
}

fn widgets(set: &DecorationSet) -> Vec<(usize, usize, String)> {
    set.widgets()
        .map(|(decoration, widget)| (decoration.from, decoration.to, widget.describe()))
        .collect()
}

fn hides(set: &DecorationSet) -> Vec<(usize, usize)> {
    set.iter()
        .filter(|d| d.kind == DecorationKind::Hide)
        .map(|d| (d.from, d.to))
        .collect()
}

fn dims(set: &DecorationSet) -> Vec<(usize, usize)> {
    set.iter()
        .filter(|d| d.kind == DecorationKind::Dim)
        .map(|d| (d.from, d.to))
        .collect()
}

fn marks_with(set: &DecorationSet, style: &str) -> Vec<(usize, usize)> {
    set.iter()
        .filter(|d| match &d.kind {
            DecorationKind::Mark(attributes) => attributes.style.as_deref() == Some(style),
            _ => false,
        })
        .map(|d| (d.from, d.to))
        .collect()
}

// ============ Lists ============

#[test]
fn test_bullets_become_glyph_widgets() {
    let text = "- one\n- two\n\nend";
    let set = build(text, text.len());

    assert_eq!(
        widgets(&set),
        vec![(0, 1, "bullet".to_string()), (6, 7, "bullet".to_string())]
    );
    assert_eq!(set.line_attributes(0).count(), 1);
}

#[test]
fn test_bullet_on_cursor_line_stays_raw() {
    let text = "- one\n- two\n\nend";
    let set = build(text, 3);

    assert_eq!(widgets(&set), vec![(6, 7, "bullet".to_string())]);
    // The list line style is applied revealed or not.
    assert_eq!(set.line_attributes(0).count(), 1);
}

#[test]
fn test_ordered_markers_are_styled() {
    let text = "1. one\n2. two\n\nend";
    let set = build(text, text.len());

    assert_eq!(marks_with(&set, styles::ORDERED_MARKER), vec![(0, 2), (7, 9)]);
    assert!(widgets(&set).is_empty());
}

#[test]
fn test_task_item_becomes_checkbox() {
    let text = "- [ ] open task\n- [x] done\n\nend";
    let set = build(text, text.len());

    assert_eq!(
        widgets(&set),
        vec![
            (0, 6, "task checked=false marker=2..5".to_string()),
            (16, 22, "task checked=true marker=18..21".to_string()),
        ]
    );
}

#[test]
fn test_task_on_cursor_line_is_revealed() {
    let text = "- [ ] open task\n\nend";
    let set = build(text, 8);

    assert!(widgets(&set).is_empty());
}

// ============ Inline ============

#[test]
fn test_link_text_marked_and_syntax_hidden() {
    let text = "see [docs](http://x) now";
    let set = build(text, text.len());

    assert_eq!(marks_with(&set, styles::LINK_TEXT), vec![(5, 9)]);
    assert_eq!(hides(&set), vec![(4, 5), (9, 20)]);
}

#[test]
fn test_link_syntax_dimmed_under_cursor() {
    let text = "see [docs](http://x) now";
    let set = build(text, 6);

    assert_eq!(dims(&set), vec![(4, 5), (9, 20)]);
    assert!(hides(&set).is_empty());
}

#[rstest]
#[case::italic("an *em* word", styles::ITALIC, (4, 6), vec![(3, 4), (6, 7)])]
#[case::strike("an ~~old~~ word", styles::STRIKETHROUGH, (5, 8), vec![(3, 5), (8, 10)])]
#[case::code("an `x + y` word", styles::INLINE_CODE, (4, 9), vec![(3, 4), (9, 10)])]
fn test_inline_markers_hidden(
    #[case] text: &str,
    #[case] style: &str,
    #[case] content: (usize, usize),
    #[case] markers: Vec<(usize, usize)>,
) {
    let set = build(text, text.len());

    assert_eq!(marks_with(&set, style), vec![content]);
    assert_eq!(hides(&set), markers);
}

#[test]
fn test_inline_html_pair() {
    let text = "Some <u>text</u> more";

    let away = build(text, text.len());
    assert_eq!(marks_with(&away, styles::UNDERLINE), vec![(8, 12)]);
    assert_eq!(hides(&away), vec![(5, 8), (12, 16)]);

    let inside = build(text, 10);
    assert_eq!(marks_with(&inside, styles::UNDERLINE), vec![(8, 12)]);
    assert_eq!(dims(&inside), vec![(5, 8), (12, 16)]);
}

// ============ Math ============

#[test]
fn test_only_the_touched_formula_is_revealed() {
    let text = "alpha $x$ beta $y$ gamma";
    let set = build(text, 7);

    assert_eq!(
        widgets(&set),
        vec![(15, 18, "math inline \"y\"".to_string())]
    );
}

#[test]
fn test_dollars_in_code_are_not_math() {
    let text = "cost `$5 and $6` total";
    let set = build(text, text.len());

    assert!(widgets(&set).is_empty());
}

// ============ Blocks ============

#[test]
fn test_table_is_always_a_widget() {
    let text = "| a | b |\n|---|---|\n| 1 | 2 |\n\nafter";

    for cursor in [0, 12, text.len()] {
        let set = build(text, cursor);
        assert_eq!(widgets(&set), vec![(0, 29, "table 1x2".to_string())]);
    }
}

#[test]
fn test_fenced_code_decorations() {
    let text = "```rust\nlet x = 1;\n```\n\nafter";
    let set = build(text, text.len());

    assert_eq!(hides(&set), vec![(0, 7), (19, 22)]);
    assert_eq!(widgets(&set), vec![(7, 7, "code-badge \"rust\"".to_string())]);

    let code_line: Vec<_> = set.line_attributes(8).collect();
    assert_eq!(code_line.len(), 1);
    assert_eq!(code_line[0].class.as_deref(), Some(styles::CODE_LINE_CLASS));
    assert_eq!(
        code_line[0].data,
        vec![("data-line-number".to_string(), "1".to_string())]
    );

    // `let` is coloured as a keyword.
    assert!(set.iter().any(|d| d.from == 8
        && d.to == 11
        && matches!(&d.kind, DecorationKind::Mark(a) if a.style.as_deref().is_some_and(|s| s.starts_with("color:")))));
}

#[test]
fn test_code_after_attribute_line_is_still_coloured() {
    let text = "```rust\n#[derive(Debug)]\nstruct Point;\n```\n\nafter";
    let set = build(text, text.len());
    let struct_line = text.find("struct").unwrap();

    // `struct` is coloured even though the line above starts with `#`.
    assert!(set.iter().any(|d| d.from == struct_line
        && d.to == struct_line + "struct".len()
        && matches!(&d.kind, DecorationKind::Mark(a) if a.style.as_deref().is_some_and(|s| s.starts_with("color:")))));
}

#[test]
fn test_mermaid_renders_as_diagram_unless_revealed() {
    let text = "```mermaid\ngraph TD\n```\n\nafter";

    let away = build(text, text.len());
    assert_eq!(
        widgets(&away),
        vec![(0, 23, "diagram \"graph TD\"".to_string())]
    );

    let inside = build(text, 13);
    assert!(
        inside
            .widgets()
            .all(|(_, widget)| !matches!(widget, Widget::Diagram(_)))
    );
}

#[test]
fn test_toc_lists_every_heading() {
    let text = "# First\n\n[toc]\n\n## Second";

    let away = build(text, text.len());
    assert_eq!(
        widgets(&away),
        vec![(9, 14, "toc \"0:1:First|16:2:Second\"".to_string())]
    );

    let inside = build(text, 11);
    assert!(widgets(&inside).is_empty());
}

#[test]
fn test_blockquote_markers() {
    let text = "> quoted\n\nafter";

    let away = build(text, text.len());
    assert_eq!(hides(&away), vec![(0, 2)]);
    assert_eq!(
        away.line_attributes(0)
            .filter(|a| a.style.as_deref() == Some(styles::BLOCKQUOTE_LINE))
            .count(),
        1
    );
    assert_eq!(away.line_attributes(10).count(), 0);

    let on_line = build(text, 4);
    assert_eq!(dims(&on_line), vec![(0, 2)]);
}

#[test]
fn test_image_widget_off_cursor_line() {
    let text = "![alt](pic.png)\n\nafter";

    let away = build(text, text.len());
    assert_eq!(
        widgets(&away),
        vec![(0, 15, "image \"pic.png\" alt=\"alt\"".to_string())]
    );

    assert!(widgets(&build(text, 3)).is_empty());
}

// ============ Whole document ============

const MIXED: &str = "# Heading\n\nSome **bold** and *italic* with `code` and [a link](http://x).\n\n- item one\n- [ ] task\n1. first\n\n> quote with <u>under</u>\n\n| h1 | h2 |\n|----|----|\n| a  | b  |\n\n```js\nconst x = 1;\n```\n\n$$\nE = mc^2\n$$\n\nInline $a+b$ math.\n\n[toc]\n\n---\n\nEnd\n";

#[test]
fn test_no_two_replacements_overlap() {
    for cursor in [0, 20, 60, 90, 130, MIXED.len()] {
        let set = build(MIXED, cursor);
        assert_eq!(set.overlapping_replacements(), Vec::new(), "cursor at {cursor}");
    }
}

#[test]
fn test_rebuild_is_idempotent() {
    assert_eq!(build(MIXED, 42), build(MIXED, 42));
}
