//! Editor/preview position pairs and the interpolation between them.

use super::{EditorPane, PreviewPane};

/// One editor position matched with one preview position, both in content
/// pixels from the top of their pane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    pub editor_top: f64,
    pub preview_top: f64,
}

/// Which coordinate space a scroll position is mapped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapDirection {
    EditorToPreview,
    PreviewToEditor,
}

impl MapDirection {
    fn from(self, anchor: &ScrollAnchor) -> f64 {
        match self {
            MapDirection::EditorToPreview => anchor.editor_top,
            MapDirection::PreviewToEditor => anchor.preview_top,
        }
    }

    fn to(self, anchor: &ScrollAnchor) -> f64 {
        match self {
            MapDirection::EditorToPreview => anchor.preview_top,
            MapDirection::PreviewToEditor => anchor.editor_top,
        }
    }
}

/// Pair every tagged preview element with the top of its source line.
///
/// Tags outside `1..=line_count` are skipped. When several elements land on
/// the same editor position the smallest preview position wins.
pub fn build_anchors(editor: &dyn EditorPane, preview: &dyn PreviewPane) -> Vec<ScrollAnchor> {
    let line_count = editor.line_count();
    let mut anchors: Vec<ScrollAnchor> = preview
        .tagged_elements()
        .into_iter()
        .filter(|element| element.line >= 1 && element.line <= line_count)
        .filter_map(|element| {
            editor.line_block(element.line).map(|block| ScrollAnchor {
                editor_top: block.top,
                preview_top: element.top,
            })
        })
        .collect();

    anchors.sort_by(|a, b| {
        a.editor_top
            .total_cmp(&b.editor_top)
            .then(a.preview_top.total_cmp(&b.preview_top))
    });
    anchors.dedup_by(|later, earlier| later.editor_top == earlier.editor_top);
    anchors
}

/// Index of the first anchor whose source position is `>= value`.
pub fn lower_bound(anchors: &[ScrollAnchor], value: f64, direction: MapDirection) -> usize {
    anchors.partition_point(|anchor| direction.from(anchor) < value)
}

/// Map `scroll_top` between coordinate spaces by linear interpolation.
///
/// Anchors live in content space while scroll offsets stop at the scrollable
/// height, so an anchor past the end of the source scroll range is replaced
/// by the `(from_scrollable, to_scrollable)` end point.
pub fn interpolate_scroll(
    scroll_top: f64,
    anchors: &[ScrollAnchor],
    direction: MapDirection,
    from_scrollable: f64,
    to_scrollable: f64,
) -> f64 {
    if from_scrollable <= 0.0 || to_scrollable <= 0.0 {
        return 0.0;
    }
    if anchors.len() < 2 {
        return (scroll_top / from_scrollable * to_scrollable).clamp(0.0, to_scrollable);
    }

    let next_index = lower_bound(anchors, scroll_top, direction);

    let (prev_from, prev_to) = match next_index.checked_sub(1).and_then(|i| anchors.get(i)) {
        Some(prev) => (direction.from(prev), direction.to(prev)),
        None => (0.0, 0.0),
    };

    let (next_from, next_to) = match anchors.get(next_index) {
        Some(next) if direction.from(next) <= from_scrollable => {
            (direction.from(next), direction.to(next))
        }
        _ => (from_scrollable, to_scrollable),
    };

    let from_range = next_from - prev_from;
    if from_range <= 0.0 {
        return next_to.clamp(0.0, to_scrollable);
    }
    let ratio = (scroll_top - prev_from) / from_range;
    (prev_to + ratio * (next_to - prev_to)).clamp(0.0, to_scrollable)
}

/// Anchor list rebuilt lazily after the layout changes.
#[derive(Debug, Clone, Default)]
pub struct AnchorCache {
    anchors: Vec<ScrollAnchor>,
    dirty: bool,
}

impl AnchorCache {
    pub fn new() -> Self {
        Self {
            anchors: Vec::new(),
            dirty: true,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
        self.dirty = true;
    }

    pub fn ensure(&mut self, editor: &dyn EditorPane, preview: &dyn PreviewPane) -> &[ScrollAnchor] {
        if self.dirty {
            self.anchors = build_anchors(editor, preview);
            self.dirty = false;
            log::debug!("Rebuilt {} scroll anchors", self.anchors.len());
        }
        &self.anchors
    }
}
