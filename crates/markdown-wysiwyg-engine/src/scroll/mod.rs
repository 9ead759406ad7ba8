//! # Scroll synchronisation
//!
//! Keeps an editor pane and a rendered preview pane aligned while either one
//! is scrolled.
//!
//! - [`anchors`]: editor/preview position pairs and interpolation
//! - [`mapping`]: boundary snap, direct element lookup, fallback mapping
//! - [`smoothing`]: per-frame easing and the decaying manual offset
//! - [`frames`]: at most one pending callback per source
//!
//! The pane the user is scrolling becomes the driver for a short lock
//! window; scroll activity from the other pane is ignored meanwhile. Every
//! programmatic write is remembered so its echo is not mistaken for the user.
//!
//! The engine owns no clock. Hosts poll the editor offset once per frame,
//! forward preview scroll events, and call [`ScrollSync::run_frame`] while
//! [`ScrollSync::needs_frame`] is true.

pub mod anchors;
pub mod frames;
pub mod mapping;
pub mod smoothing;

use markdown_wysiwyg_config::ScrollSyncSettings;

use anchors::AnchorCache;
use frames::{FrameQueue, FrameSource};
use mapping::{map_editor_to_preview, map_preview_to_editor, snap_to_boundary};
use smoothing::{DecayingOffset, lerp_step};

pub use anchors::ScrollAnchor;

/// A scrollable host element.
pub trait ScrollPane {
    fn scroll_top(&self) -> f64;
    fn set_scroll_top(&mut self, top: f64);
    fn scroll_height(&self) -> f64;
    fn client_height(&self) -> f64;

    fn scrollable(&self) -> f64 {
        (self.scroll_height() - self.client_height()).max(0.0)
    }
}

/// Pixel geometry of one rendered editor line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBlock {
    pub number: usize,
    pub top: f64,
    pub height: f64,
}

pub trait EditorPane: ScrollPane {
    fn line_count(&self) -> usize;
    /// The line rendered at content offset `y`.
    fn line_at_height(&self, y: f64) -> Option<LineBlock>;
    fn line_block(&self, number: usize) -> Option<LineBlock>;
}

/// A preview element tagged with the source line it was rendered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaggedElement {
    pub line: usize,
    /// Content offset from the top of the preview.
    pub top: f64,
    pub height: f64,
}

pub trait PreviewPane: ScrollPane {
    /// Every tagged element, in document order.
    fn tagged_elements(&self) -> Vec<TaggedElement>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Editor,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DriverLock {
    driver: Driver,
    until_ms: f64,
}

pub struct ScrollSync {
    settings: ScrollSyncSettings,
    anchors: AnchorCache,
    frames: FrameQueue,
    lock: Option<DriverLock>,
    last_programmatic_editor: Option<f64>,
    last_programmatic_preview: Option<f64>,
    last_editor_sample: Option<f64>,
    animation_target: Option<f64>,
    offset: Option<DecayingOffset>,
}

impl ScrollSync {
    pub fn new(settings: ScrollSyncSettings) -> Self {
        Self {
            settings,
            anchors: AnchorCache::new(),
            frames: FrameQueue::new(),
            lock: None,
            last_programmatic_editor: None,
            last_programmatic_preview: None,
            last_editor_sample: None,
            animation_target: None,
            offset: None,
        }
    }

    pub fn settings(&self) -> &ScrollSyncSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
        if !enabled {
            self.dispose();
        }
    }

    /// The pane currently holding the lock at `now_ms`, if any.
    pub fn driver(&self, now_ms: f64) -> Option<Driver> {
        self.lock
            .filter(|lock| now_ms < lock.until_ms)
            .map(|lock| lock.driver)
    }

    pub fn is_animating(&self) -> bool {
        self.animation_target.is_some()
    }

    pub fn needs_frame(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Sample the editor offset. Called once per frame because hosts cannot
    /// rely on editor scroll events. Returns whether a sync was scheduled.
    pub fn poll_editor(&mut self, editor: &dyn EditorPane) -> bool {
        if !self.settings.enabled {
            return false;
        }
        let top = editor.scroll_top();
        if self.last_editor_sample == Some(top) {
            return false;
        }
        self.last_editor_sample = Some(top);
        if self.is_echo(top, self.last_programmatic_editor) {
            return false;
        }
        self.frames.schedule(FrameSource::EditorSync)
    }

    /// A scroll event from the preview pane. Returns whether it counted as a
    /// user scroll.
    pub fn on_preview_scroll(&mut self, preview: &dyn PreviewPane, now_ms: f64) -> bool {
        if !self.settings.enabled {
            return false;
        }
        let top = preview.scroll_top();
        if self.is_echo(top, self.last_programmatic_preview) {
            return false;
        }
        if let Some(target) = self.animation_target.take() {
            // The user grabbed the preview mid-animation; keep their position.
            self.frames.cancel(FrameSource::Animation);
            self.lock = None;
            self.offset = Some(DecayingOffset::new(
                top - target,
                now_ms,
                self.settings.offset_tau_ms,
                self.settings.offset_discard_ratio,
            ));
        }
        self.frames.schedule(FrameSource::PreviewSync)
    }

    /// The rendered preview changed (content mutation). Anchors rebuild on next use.
    pub fn mark_anchors_dirty(&mut self) {
        self.anchors.mark_dirty();
    }

    /// Resize or image load: rebuild anchors and re-align from the editor.
    pub fn invalidate_layout(&mut self) {
        self.anchors.mark_dirty();
        if self.settings.enabled {
            self.frames.schedule(FrameSource::EditorSync);
        }
    }

    pub fn anchors_dirty(&self) -> bool {
        self.anchors.is_dirty()
    }

    /// Run everything scheduled for this frame. Returns whether another frame
    /// is wanted.
    pub fn run_frame(
        &mut self,
        now_ms: f64,
        editor: &mut dyn EditorPane,
        preview: &mut dyn PreviewPane,
    ) -> bool {
        for source in self.frames.take_due() {
            match source {
                FrameSource::EditorSync => self.sync_from_editor(now_ms, editor, preview),
                FrameSource::PreviewSync => self.sync_from_preview(now_ms, editor, preview),
                FrameSource::Animation => self.step_animation(now_ms, preview),
            }
        }
        self.needs_frame()
    }

    /// Keep the clicked line at the same viewport fraction in both panes.
    ///
    /// Jumps the preview at once and records the gap to the regular mapping
    /// as a decaying offset, so the next editor-driven sync does not undo it.
    pub fn sync_cursor_click(
        &mut self,
        line: usize,
        now_ms: f64,
        editor: &dyn EditorPane,
        preview: &mut dyn PreviewPane,
    ) -> Option<f64> {
        if !self.settings.enabled {
            return None;
        }
        let block = editor.line_block(line)?;
        let element = preview
            .tagged_elements()
            .into_iter()
            .filter(|element| element.line <= line)
            .last()?;

        let client = editor.client_height();
        let fraction = if client > 0.0 {
            ((block.top - editor.scroll_top()) / client).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = (element.top - fraction * preview.client_height()).clamp(0.0, preview.scrollable());

        let mapped = map_editor_to_preview(editor, &*preview, &mut self.anchors, &self.settings);
        self.offset = Some(DecayingOffset::new(
            target - mapped,
            now_ms,
            self.settings.offset_tau_ms,
            self.settings.offset_discard_ratio,
        ));

        self.animation_target = None;
        self.frames.cancel(FrameSource::Animation);
        self.lock(Driver::Editor, now_ms);
        preview.set_scroll_top(target);
        self.last_programmatic_preview = Some(preview.scroll_top());
        Some(target)
    }

    /// Cancel pending frames and forget locks, animation and offsets.
    pub fn dispose(&mut self) {
        self.frames.cancel_all();
        self.anchors.clear();
        self.lock = None;
        self.animation_target = None;
        self.offset = None;
        self.last_editor_sample = None;
    }

    fn is_echo(&self, top: f64, programmatic: Option<f64>) -> bool {
        programmatic.is_some_and(|written| (top - written).abs() <= self.settings.epsilon_px)
    }

    fn lock(&mut self, driver: Driver, now_ms: f64) {
        self.lock = Some(DriverLock {
            driver,
            until_ms: now_ms + self.settings.driver_lock_ms,
        });
    }

    fn offset_at(&mut self, now_ms: f64) -> f64 {
        match self.offset.and_then(|offset| offset.value_at(now_ms)) {
            Some(value) => value,
            None => {
                self.offset = None;
                0.0
            }
        }
    }

    fn sync_from_editor(&mut self, now_ms: f64, editor: &dyn EditorPane, preview: &mut dyn PreviewPane) {
        if !self.settings.enabled || self.driver(now_ms) == Some(Driver::Preview) {
            return;
        }
        let snapped = snap_to_boundary(
            editor.scroll_top(),
            editor.scrollable(),
            preview.scrollable(),
            &self.settings,
        );
        let target = match snapped {
            Some(edge) => {
                self.offset = None;
                edge
            }
            None => {
                let mapped = map_editor_to_preview(editor, &*preview, &mut self.anchors, &self.settings);
                (mapped + self.offset_at(now_ms)).clamp(0.0, preview.scrollable())
            }
        };

        if self.animation_target.is_none()
            && (preview.scroll_top() - target).abs() <= self.settings.epsilon_px
        {
            return;
        }
        self.animation_target = Some(target);
        self.step_animation(now_ms, preview);
    }

    fn step_animation(&mut self, now_ms: f64, preview: &mut dyn PreviewPane) {
        let Some(target) = self.animation_target else {
            return;
        };
        let next = lerp_step(
            preview.scroll_top(),
            target,
            self.settings.lerp,
            self.settings.epsilon_px,
        );
        self.lock(Driver::Editor, now_ms);
        preview.set_scroll_top(next);
        self.last_programmatic_preview = Some(preview.scroll_top());

        if next == target {
            self.animation_target = None;
        } else {
            self.frames.schedule(FrameSource::Animation);
        }
    }

    fn sync_from_preview(&mut self, now_ms: f64, editor: &mut dyn EditorPane, preview: &dyn PreviewPane) {
        if !self.settings.enabled || self.driver(now_ms) == Some(Driver::Editor) {
            return;
        }
        let target = map_preview_to_editor(&*editor, preview, &mut self.anchors, &self.settings);
        if (editor.scroll_top() - target).abs() <= self.settings.epsilon_px {
            return;
        }
        self.lock(Driver::Preview, now_ms);
        editor.set_scroll_top(target);
        self.last_programmatic_editor = Some(editor.scroll_top());
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Uniform line heights; scroll writes are clamped like a real element.
    pub struct FakeEditor {
        pub line_count: usize,
        pub line_height: f64,
        pub client_height: f64,
        pub scroll_top: f64,
    }

    impl FakeEditor {
        pub fn new(line_count: usize, line_height: f64, client_height: f64) -> Self {
            Self {
                line_count,
                line_height,
                client_height,
                scroll_top: 0.0,
            }
        }
    }

    impl ScrollPane for FakeEditor {
        fn scroll_top(&self) -> f64 {
            self.scroll_top
        }

        fn set_scroll_top(&mut self, top: f64) {
            self.scroll_top = top.clamp(0.0, self.scrollable());
        }

        fn scroll_height(&self) -> f64 {
            self.line_count as f64 * self.line_height
        }

        fn client_height(&self) -> f64 {
            self.client_height
        }
    }

    impl EditorPane for FakeEditor {
        fn line_count(&self) -> usize {
            self.line_count
        }

        fn line_at_height(&self, y: f64) -> Option<LineBlock> {
            if self.line_count == 0 || y < 0.0 {
                return None;
            }
            let number = ((y / self.line_height) as usize + 1).min(self.line_count);
            self.line_block(number)
        }

        fn line_block(&self, number: usize) -> Option<LineBlock> {
            (1..=self.line_count).contains(&number).then(|| LineBlock {
                number,
                top: (number - 1) as f64 * self.line_height,
                height: self.line_height,
            })
        }
    }

    pub struct FakePreview {
        pub elements: Vec<TaggedElement>,
        pub scroll_height: f64,
        pub client_height: f64,
        pub scroll_top: f64,
    }

    impl FakePreview {
        pub fn new(elements: Vec<TaggedElement>, scroll_height: f64, client_height: f64) -> Self {
            Self {
                elements,
                scroll_height,
                client_height,
                scroll_top: 0.0,
            }
        }
    }

    impl ScrollPane for FakePreview {
        fn scroll_top(&self) -> f64 {
            self.scroll_top
        }

        fn set_scroll_top(&mut self, top: f64) {
            self.scroll_top = top.clamp(0.0, self.scrollable());
        }

        fn scroll_height(&self) -> f64 {
            self.scroll_height
        }

        fn client_height(&self) -> f64 {
            self.client_height
        }
    }

    impl PreviewPane for FakePreview {
        fn tagged_elements(&self) -> Vec<TaggedElement> {
            self.elements.clone()
        }
    }
}
