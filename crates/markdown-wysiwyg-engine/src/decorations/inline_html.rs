//! Pairing of raw inline HTML tags (`<u>`, `<sup>`, `<sub>`).
//!
//! The syntax tree only reports individual tags, so open and close markers are
//! matched here. A close marker pops the nearest open marker of the same tag
//! and discards any opens pushed after it, which silently drops decoration for
//! malformed inner tags instead of failing the pass.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::ranges::{DocRange, RangeChecker, is_selection_in_range, overlaps_any, sort_ranges, split_excluding};
use super::styles;
use super::{Attributes, Decoration};
use crate::editing::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InlineHtmlTag {
    Underline,
    Superscript,
    Subscript,
}

impl InlineHtmlTag {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "u" => Some(InlineHtmlTag::Underline),
            "sup" => Some(InlineHtmlTag::Superscript),
            "sub" => Some(InlineHtmlTag::Subscript),
            _ => None,
        }
    }

    pub fn content_style(&self) -> &'static str {
        match self {
            InlineHtmlTag::Underline => styles::UNDERLINE,
            InlineHtmlTag::Superscript => styles::SUPERSCRIPT,
            InlineHtmlTag::Subscript => styles::SUBSCRIPT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerType {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InlineHtmlMarker {
    pub marker_type: MarkerType,
    pub tag: InlineHtmlTag,
    pub from: usize,
    pub to: usize,
}

impl InlineHtmlMarker {
    pub fn open(tag: InlineHtmlTag, from: usize, to: usize) -> Self {
        Self {
            marker_type: MarkerType::Open,
            tag,
            from,
            to,
        }
    }

    pub fn close(tag: InlineHtmlTag, from: usize, to: usize) -> Self {
        Self {
            marker_type: MarkerType::Close,
            tag,
            from,
            to,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineHtmlTagPair {
    pub tag: InlineHtmlTag,
    pub open: DocRange,
    pub close: DocRange,
    pub content: DocRange,
    pub range: DocRange,
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^<\s*(/?)\s*([a-zA-Z][\w:-]*)\b[^>]*>$").expect("valid marker regex")
    })
}

fn self_closing_regex() -> &'static Regex {
    static SELF_CLOSING: OnceLock<Regex> = OnceLock::new();
    SELF_CLOSING.get_or_init(|| Regex::new(r"/\s*>$").expect("valid self-closing regex"))
}

/// Classify the raw text of an HTML tag node. Unsupported and self-closing
/// tags yield `None`.
pub fn parse_inline_html_marker(raw: &str, from: usize, to: usize) -> Option<InlineHtmlMarker> {
    if from >= to {
        return None;
    }
    let captures = marker_regex().captures(raw)?;
    if self_closing_regex().is_match(raw) {
        return None;
    }

    let tag = InlineHtmlTag::from_name(&captures.get(2)?.as_str().to_lowercase())?;
    let marker_type = if captures.get(1).is_some_and(|m| m.as_str() == "/") {
        MarkerType::Close
    } else {
        MarkerType::Open
    };

    Some(InlineHtmlMarker {
        marker_type,
        tag,
        from,
        to,
    })
}

fn pop_matching_open(stack: &mut Vec<InlineHtmlMarker>, tag: InlineHtmlTag) -> Option<InlineHtmlMarker> {
    let index = stack.iter().rposition(|marker| marker.tag == tag)?;
    let marker = stack[index];
    stack.truncate(index);
    Some(marker)
}

/// Match open and close markers. `excluded` must be sorted by start.
pub fn pair_markers(markers: &[InlineHtmlMarker], excluded: &[DocRange]) -> Vec<InlineHtmlTagPair> {
    let mut sorted = markers.to_vec();
    sorted.sort_by_key(|marker| (marker.from, marker.to));

    let mut in_excluded = RangeChecker::new(excluded);
    let mut stack: Vec<InlineHtmlMarker> = Vec::new();
    let mut pairs = Vec::new();

    for marker in sorted {
        if marker.from >= marker.to {
            continue;
        }
        let marker_range = DocRange::new(marker.from, marker.to);
        // Both probes must run so the checker keeps advancing in order.
        let start_excluded = in_excluded.contains(marker.from);
        let end_excluded = in_excluded.contains(marker.to - 1);
        if start_excluded || end_excluded || overlaps_any(marker_range, excluded) {
            continue;
        }

        match marker.marker_type {
            MarkerType::Open => stack.push(marker),
            MarkerType::Close => {
                let Some(open) = pop_matching_open(&mut stack, marker.tag) else {
                    continue;
                };
                if open.to > marker.from {
                    continue;
                }
                pairs.push(InlineHtmlTagPair {
                    tag: marker.tag,
                    open: DocRange::new(open.from, open.to),
                    close: marker_range,
                    content: DocRange::new(open.to, marker.from),
                    range: DocRange::new(open.from, marker.to),
                });
            }
        }
    }

    pairs
}

/// Emit content styles and marker hide/dim decorations for every valid pair.
pub fn append_inline_html_decorations(
    decorations: &mut Vec<Decoration>,
    selection: &Selection,
    markers: &[InlineHtmlMarker],
    excluded: &[DocRange],
) {
    let mut excluded = excluded.to_vec();
    sort_ranges(&mut excluded);

    for pair in pair_markers(markers, &excluded) {
        let reveal = is_selection_in_range(selection, pair.range.from, pair.range.to);

        for segment in split_excluding(pair.content, &excluded) {
            decorations.push(Decoration::mark(
                segment.from,
                segment.to,
                Attributes::style(pair.tag.content_style()),
            ));
        }

        for marker in [pair.open, pair.close] {
            if reveal {
                decorations.push(Decoration::dim(marker.from, marker.to));
            } else {
                decorations.push(Decoration::hide(marker.from, marker.to));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorations::DecorationKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn summarize(decorations: &[Decoration]) -> Vec<(usize, usize, String)> {
        decorations
            .iter()
            .map(|d| {
                let label = match &d.kind {
                    DecorationKind::Hide => "hide".to_string(),
                    DecorationKind::Dim => "dim".to_string(),
                    DecorationKind::Mark(attrs) => attrs.style.clone().unwrap_or_default(),
                    other => format!("{other:?}"),
                };
                (d.from, d.to, label)
            })
            .collect()
    }

    // ============ Marker parsing ============

    #[test]
    fn test_parses_supported_open_and_close_tags() {
        assert_eq!(
            parse_inline_html_marker("<u>", 0, 3),
            Some(InlineHtmlMarker::open(InlineHtmlTag::Underline, 0, 3))
        );
        assert_eq!(
            parse_inline_html_marker("</sup>", 10, 16),
            Some(InlineHtmlMarker::close(InlineHtmlTag::Superscript, 10, 16))
        );
        assert_eq!(
            parse_inline_html_marker("<SUB class=\"x\">", 0, 15),
            Some(InlineHtmlMarker::open(InlineHtmlTag::Subscript, 0, 15))
        );
    }

    #[rstest]
    #[case::unsupported("<strong>")]
    #[case::self_closing("<u/>")]
    #[case::self_closing_spaced("<sub />")]
    #[case::not_a_tag("u>")]
    fn test_rejects_marker(#[case] raw: &str) {
        assert_eq!(parse_inline_html_marker(raw, 0, raw.len()), None);
    }

    #[test]
    fn test_rejects_empty_range() {
        assert_eq!(parse_inline_html_marker("<u>", 3, 3), None);
    }

    // ============ Pairing and reveal ============

    #[test]
    fn test_hides_markers_when_selection_outside() {
        let markers = vec![
            InlineHtmlMarker::open(InlineHtmlTag::Underline, 0, 3),
            InlineHtmlMarker::close(InlineHtmlTag::Underline, 8, 12),
        ];
        let mut decorations = Vec::new();

        append_inline_html_decorations(&mut decorations, &Selection::caret(20), &markers, &[]);

        assert_eq!(
            summarize(&decorations),
            vec![
                (3, 8, styles::UNDERLINE.to_string()),
                (0, 3, "hide".to_string()),
                (8, 12, "hide".to_string()),
            ]
        );
    }

    #[test]
    fn test_dims_markers_when_selection_inside() {
        let markers = vec![
            InlineHtmlMarker::open(InlineHtmlTag::Superscript, 0, 5),
            InlineHtmlMarker::close(InlineHtmlTag::Superscript, 9, 15),
        ];
        let mut decorations = Vec::new();

        append_inline_html_decorations(&mut decorations, &Selection::caret(10), &markers, &[]);

        assert_eq!(
            summarize(&decorations),
            vec![
                (5, 9, styles::SUPERSCRIPT.to_string()),
                (0, 5, "dim".to_string()),
                (9, 15, "dim".to_string()),
            ]
        );
    }

    #[test]
    fn test_splits_content_around_excluded_ranges() {
        let markers = vec![
            InlineHtmlMarker::open(InlineHtmlTag::Underline, 0, 3),
            InlineHtmlMarker::close(InlineHtmlTag::Underline, 10, 14),
        ];
        let mut decorations = Vec::new();

        append_inline_html_decorations(
            &mut decorations,
            &Selection::caret(20),
            &markers,
            &[DocRange::new(5, 7)],
        );

        let styled: Vec<(usize, usize)> = summarize(&decorations)
            .into_iter()
            .filter(|(_, _, label)| label == styles::UNDERLINE)
            .map(|(from, to, _)| (from, to))
            .collect();
        assert_eq!(styled, vec![(3, 5), (7, 10)]);
    }

    #[test]
    fn test_recovers_malformed_nesting() {
        // <u><sup>x</u></sup>
        let markers = vec![
            InlineHtmlMarker::open(InlineHtmlTag::Underline, 0, 3),
            InlineHtmlMarker::open(InlineHtmlTag::Superscript, 3, 8),
            InlineHtmlMarker::close(InlineHtmlTag::Underline, 9, 13),
            InlineHtmlMarker::close(InlineHtmlTag::Superscript, 13, 19),
        ];
        let mut decorations = Vec::new();

        append_inline_html_decorations(&mut decorations, &Selection::caret(25), &markers, &[]);

        let summary = summarize(&decorations);
        assert_eq!(
            summary,
            vec![
                (3, 9, styles::UNDERLINE.to_string()),
                (0, 3, "hide".to_string()),
                (9, 13, "hide".to_string()),
            ]
        );
        assert!(!summary.iter().any(|(from, to, _)| (*from, *to) == (3, 8)));
        assert!(!summary.iter().any(|(from, to, _)| (*from, *to) == (13, 19)));
    }

    #[test]
    fn test_ignores_markers_overlapping_excluded_ranges() {
        let markers = vec![
            InlineHtmlMarker::open(InlineHtmlTag::Subscript, 4, 9),
            InlineHtmlMarker::close(InlineHtmlTag::Subscript, 11, 17),
        ];
        let mut decorations = Vec::new();

        append_inline_html_decorations(
            &mut decorations,
            &Selection::caret(0),
            &markers,
            &[DocRange::new(0, 6)],
        );

        assert!(decorations.is_empty());
    }

    #[test]
    fn test_close_before_open_is_not_paired() {
        let markers = vec![
            InlineHtmlMarker::close(InlineHtmlTag::Underline, 0, 4),
            InlineHtmlMarker::open(InlineHtmlTag::Underline, 4, 7),
        ];

        assert!(pair_markers(&markers, &[]).is_empty());
    }
}
