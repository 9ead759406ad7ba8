//! # Decorations
//!
//! Visual instructions layered over the raw buffer. The stored text never
//! changes; a host applies the set on top of its own text rendering.
//!
//! - [`ranges`]: selection predicates and the monotonic exclusion checker
//! - [`inline_html`]: `<u>`, `<sup>`, `<sub>` pairing with nesting recovery
//! - [`math`]: `$$` block and `$` inline scanning
//! - [`styles`]: the inline CSS each construct is painted with
//! - [`builder`]: the tree walk that produces a [`DecorationSet`]
//!
//! Two replacing decorations (hide or widget) never cover the same bytes.
//! Marks and line attributes may overlap anything.

pub mod builder;
pub mod inline_html;
pub mod math;
pub mod ranges;
pub mod styles;

use std::fmt;

use serde::Serialize;

pub use builder::{BuildContext, build_decorations};
pub use ranges::DocRange;

use crate::widgets::Widget;

/// HTML attributes carried by a mark or line decoration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    pub class: Option<String>,
    pub style: Option<String>,
    pub data: Vec<(String, String)>,
}

impl Attributes {
    pub fn style(style: impl Into<String>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DecorationKind {
    /// Replace the range with nothing.
    Hide,
    /// Keep the range visible but de-emphasised.
    Dim,
    /// Non-destructive styling of the range.
    Mark(Attributes),
    /// Replace the range with a rendered widget. Zero-width ranges insert.
    Widget(Widget),
    /// Attributes for the whole line starting at `from`.
    Line(Attributes),
}

impl DecorationKind {
    fn rank(&self) -> u8 {
        match self {
            DecorationKind::Line(_) => 0,
            DecorationKind::Widget(_) | DecorationKind::Hide => 1,
            DecorationKind::Dim | DecorationKind::Mark(_) => 2,
        }
    }

    pub fn is_replacing(&self) -> bool {
        matches!(self, DecorationKind::Hide | DecorationKind::Widget(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub kind: DecorationKind,
}

impl Decoration {
    pub fn hide(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Hide,
        }
    }

    pub fn dim(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Dim,
        }
    }

    pub fn mark(from: usize, to: usize, attributes: Attributes) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Mark(attributes),
        }
    }

    pub fn widget(from: usize, to: usize, widget: Widget) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Widget(widget),
        }
    }

    pub fn line(line_from: usize, attributes: Attributes) -> Self {
        Self {
            from: line_from,
            to: line_from,
            kind: DecorationKind::Line(attributes),
        }
    }

    pub fn range(&self) -> DocRange {
        DocRange::new(self.from, self.to)
    }

    pub fn widget_ref(&self) -> Option<&Widget> {
        match &self.kind {
            DecorationKind::Widget(widget) => Some(widget),
            _ => None,
        }
    }
}

/// Sorted decorations for one rebuild.
///
/// Ordered by start, then line attributes before replacements before marks,
/// then by end.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn new(mut decorations: Vec<Decoration>) -> Self {
        decorations.retain(|d| d.from <= d.to);
        decorations.sort_by(|a, b| {
            (a.from, a.kind.rank(), a.to).cmp(&(b.from, b.kind.rank(), b.to))
        });
        Self { decorations }
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
        self.decorations.iter()
    }

    /// Decorations intersecting `[from, to)`. Zero-width decorations at `from` count.
    pub fn in_range(&self, from: usize, to: usize) -> impl Iterator<Item = &Decoration> {
        self.decorations
            .iter()
            .take_while(move |d| d.from < to || (d.from == to && from == to))
            .filter(move |d| d.to > from || (d.from == d.to && d.from >= from))
    }

    pub fn widgets(&self) -> impl Iterator<Item = (&Decoration, &Widget)> {
        self.decorations
            .iter()
            .filter_map(|d| d.widget_ref().map(|widget| (d, widget)))
    }

    /// Line attributes attached to the line starting at `line_from`.
    pub fn line_attributes(&self, line_from: usize) -> impl Iterator<Item = &Attributes> {
        self.decorations.iter().filter_map(move |d| match &d.kind {
            DecorationKind::Line(attributes) if d.from == line_from => Some(attributes),
            _ => None,
        })
    }

    /// Pairs of replacing decorations that claim overlapping bytes.
    pub fn overlapping_replacements(&self) -> Vec<(DocRange, DocRange)> {
        let replacing: Vec<DocRange> = self
            .decorations
            .iter()
            .filter(|d| d.kind.is_replacing() && d.from < d.to)
            .map(Decoration::range)
            .collect();

        let mut overlaps = Vec::new();
        for (i, a) in replacing.iter().enumerate() {
            for b in &replacing[i + 1..] {
                if b.from >= a.to {
                    break;
                }
                if a.overlaps(b) {
                    overlaps.push((*a, *b));
                }
            }
        }
        overlaps
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a Decoration;
    type IntoIter = std::slice::Iter<'a, Decoration>;

    fn into_iter(self) -> Self::IntoIter {
        self.decorations.iter()
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(class) = &self.class {
            parts.push(format!("class={class:?}"));
        }
        if let Some(style) = &self.style {
            parts.push(format!("style={style:?}"));
        }
        for (name, value) in &self.data {
            parts.push(format!("{name}={value:?}"));
        }
        write!(f, "{}", parts.join(" "))
    }
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} ", self.from, self.to)?;
        match &self.kind {
            DecorationKind::Hide => write!(f, "hide"),
            DecorationKind::Dim => write!(f, "dim"),
            DecorationKind::Mark(attributes) => write!(f, "mark {attributes}"),
            DecorationKind::Line(attributes) => write!(f, "line {attributes}"),
            DecorationKind::Widget(widget) => write!(f, "widget {}", widget.describe()),
        }
    }
}

impl fmt::Display for DecorationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decoration in &self.decorations {
            writeln!(f, "{decoration}")?;
        }
        Ok(())
    }
}
