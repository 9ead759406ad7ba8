//! Mapping a scroll offset from one pane to the other.
//!
//! Three strategies are tried in order: boundary snap, direct lookup through
//! the tagged preview elements, then anchor interpolation.

use markdown_wysiwyg_config::ScrollSyncSettings;

use super::anchors::{AnchorCache, MapDirection, interpolate_scroll};
use super::{EditorPane, PreviewPane, TaggedElement};

/// Snap tolerance: a fraction of the scrollable range, kept within
/// `[boundary_min_px, boundary_max_px]`.
pub fn boundary_tolerance(scrollable: f64, settings: &ScrollSyncSettings) -> f64 {
    (scrollable * settings.boundary_ratio).clamp(settings.boundary_min_px, settings.boundary_max_px)
}

/// Top or bottom of the target when the source sits at its own top or bottom.
pub fn snap_to_boundary(
    source_top: f64,
    source_scrollable: f64,
    target_scrollable: f64,
    settings: &ScrollSyncSettings,
) -> Option<f64> {
    if source_scrollable <= 0.0 || target_scrollable <= 0.0 {
        return Some(0.0);
    }
    let tolerance = boundary_tolerance(source_scrollable, settings);
    if source_top <= tolerance {
        Some(0.0)
    } else if source_top >= source_scrollable - tolerance {
        Some(target_scrollable)
    } else {
        None
    }
}

/// Preview position for the editor line at the editor's scroll offset.
///
/// An element tagged with that exact line maps by geometry: its top plus the
/// offset into the source line, scaled by the height ratio (capped). Otherwise
/// the offset is interpolated between the tagged elements on either side.
pub fn direct_editor_to_preview(
    editor: &dyn EditorPane,
    elements: &[TaggedElement],
    max_height_ratio: f64,
) -> Option<f64> {
    let scroll_top = editor.scroll_top();
    let line = editor.line_at_height(scroll_top)?;
    let into_line = (scroll_top - line.top).max(0.0);

    if let Some(element) = elements.iter().find(|element| element.line == line.number) {
        let ratio = height_ratio(element.height, line.height, max_height_ratio);
        return Some(element.top + into_line * ratio);
    }

    let prev = elements.iter().rev().find(|element| element.line < line.number)?;
    let next = elements.iter().find(|element| element.line > line.number)?;
    let prev_top = editor.line_block(prev.line)?.top;
    let next_top = editor.line_block(next.line)?.top;
    let span = next_top - prev_top;
    if span <= 0.0 {
        return Some(prev.top);
    }
    let fraction = ((scroll_top - prev_top) / span).clamp(0.0, 1.0);
    Some(prev.top + fraction * (next.top - prev.top))
}

/// Editor position for the tagged element at the preview's scroll offset.
pub fn direct_preview_to_editor(
    preview: &dyn PreviewPane,
    editor: &dyn EditorPane,
    elements: &[TaggedElement],
    max_height_ratio: f64,
) -> Option<f64> {
    let scroll_top = preview.scroll_top();
    let index = elements.iter().rposition(|element| element.top <= scroll_top)?;
    let element = &elements[index];
    let block = editor.line_block(element.line)?;

    if scroll_top < element.top + element.height {
        let ratio = height_ratio(block.height, element.height, max_height_ratio);
        return Some(block.top + (scroll_top - element.top) * ratio);
    }

    let next = elements.get(index + 1)?;
    let next_block = editor.line_block(next.line)?;
    let span = next.top - element.top;
    if span <= 0.0 {
        return Some(block.top);
    }
    let fraction = ((scroll_top - element.top) / span).clamp(0.0, 1.0);
    Some(block.top + fraction * (next_block.top - block.top))
}

fn height_ratio(target_height: f64, source_height: f64, cap: f64) -> f64 {
    if source_height <= 0.0 {
        return 0.0;
    }
    (target_height / source_height).min(cap)
}

/// Preview scroll target for the editor's current offset.
pub fn map_editor_to_preview(
    editor: &dyn EditorPane,
    preview: &dyn PreviewPane,
    anchors: &mut AnchorCache,
    settings: &ScrollSyncSettings,
) -> f64 {
    let source_scrollable = editor.scrollable();
    let target_scrollable = preview.scrollable();
    if let Some(snapped) = snap_to_boundary(editor.scroll_top(), source_scrollable, target_scrollable, settings) {
        return snapped;
    }

    let elements = preview.tagged_elements();
    if let Some(target) = direct_editor_to_preview(editor, &elements, settings.max_height_ratio) {
        return target.clamp(0.0, target_scrollable);
    }

    interpolate_scroll(
        editor.scroll_top(),
        anchors.ensure(editor, preview),
        MapDirection::EditorToPreview,
        source_scrollable,
        target_scrollable,
    )
}

/// Editor scroll target for the preview's current offset.
pub fn map_preview_to_editor(
    editor: &dyn EditorPane,
    preview: &dyn PreviewPane,
    anchors: &mut AnchorCache,
    settings: &ScrollSyncSettings,
) -> f64 {
    let source_scrollable = preview.scrollable();
    let target_scrollable = editor.scrollable();
    if let Some(snapped) = snap_to_boundary(preview.scroll_top(), source_scrollable, target_scrollable, settings) {
        return snapped;
    }

    let elements = preview.tagged_elements();
    if let Some(target) = direct_preview_to_editor(preview, editor, &elements, settings.max_height_ratio) {
        return target.clamp(0.0, target_scrollable);
    }

    interpolate_scroll(
        preview.scroll_top(),
        anchors.ensure(editor, preview),
        MapDirection::PreviewToEditor,
        source_scrollable,
        target_scrollable,
    )
}
