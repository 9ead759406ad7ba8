use markdown_wysiwyg_config::ScrollSyncSettings;
use markdown_wysiwyg_engine::scroll::{
    Driver, EditorPane, LineBlock, PreviewPane, ScrollPane, ScrollSync, TaggedElement,
};
use pretty_assertions::assert_eq;

const FRAME_MS: f64 = 16.0;

/// 100 lines of 20px in a 300px viewport: scrollable 1700.
struct Editor {
    scroll_top: f64,
    writes: usize,
}

impl ScrollPane for Editor {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.writes += 1;
        self.scroll_top = top.clamp(0.0, self.scrollable());
    }

    fn scroll_height(&self) -> f64 {
        2000.0
    }

    fn client_height(&self) -> f64 {
        300.0
    }
}

impl EditorPane for Editor {
    fn line_count(&self) -> usize {
        100
    }

    fn line_at_height(&self, y: f64) -> Option<LineBlock> {
        self.line_block(((y.max(0.0) / 20.0) as usize + 1).min(100))
    }

    fn line_block(&self, number: usize) -> Option<LineBlock> {
        (1..=100).contains(&number).then(|| LineBlock {
            number,
            top: (number - 1) as f64 * 20.0,
            height: 20.0,
        })
    }
}

/// Every tenth line is a tagged 80px block: scrollable 3700.
struct Preview {
    scroll_top: f64,
    writes: usize,
}

impl ScrollPane for Preview {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.writes += 1;
        self.scroll_top = top.clamp(0.0, self.scrollable());
    }

    fn scroll_height(&self) -> f64 {
        4000.0
    }

    fn client_height(&self) -> f64 {
        300.0
    }
}

impl PreviewPane for Preview {
    fn tagged_elements(&self) -> Vec<TaggedElement> {
        (0..10)
            .map(|i| TaggedElement {
                line: i * 10 + 1,
                top: i as f64 * 400.0,
                height: 80.0,
            })
            .collect()
    }
}

fn panes() -> (Editor, Preview) {
    (
        Editor {
            scroll_top: 0.0,
            writes: 0,
        },
        Preview {
            scroll_top: 0.0,
            writes: 0,
        },
    )
}

/// Run frames until the engine is idle. Returns the time after the last frame.
fn settle(sync: &mut ScrollSync, mut now: f64, editor: &mut Editor, preview: &mut Preview) -> f64 {
    for _ in 0..200 {
        if !sync.run_frame(now, editor, preview) {
            break;
        }
        now += FRAME_MS;
    }
    now
}

// ============ Boundaries ============

#[test]
fn test_editor_bottom_reaches_preview_bottom() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    editor.scroll_top = 1700.0;
    assert!(sync.poll_editor(&editor));
    settle(&mut sync, 0.0, &mut editor, &mut preview);

    assert_eq!(preview.scroll_top, 3700.0);
}

#[test]
fn test_editor_top_reaches_preview_top() {
    let (mut editor, mut preview) = panes();
    preview.scroll_top = 900.0;
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    editor.scroll_top = 1.5;
    sync.poll_editor(&editor);
    settle(&mut sync, 0.0, &mut editor, &mut preview);

    assert_eq!(preview.scroll_top, 0.0);
}

#[test]
fn test_preview_bottom_reaches_editor_bottom() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    preview.scroll_top = 3695.0;
    assert!(sync.on_preview_scroll(&preview, 0.0));
    settle(&mut sync, 0.0, &mut editor, &mut preview);

    assert_eq!(editor.scroll_top, 1700.0);
}

// ============ Direct lookup ============

#[test]
fn test_tagged_line_maps_through_element_geometry() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    // Line 21 starts at 400 and is tagged at preview 800 (80px tall).
    editor.scroll_top = 410.0;
    sync.poll_editor(&editor);
    settle(&mut sync, 0.0, &mut editor, &mut preview);

    // 10px into a 20px line, element four times as tall but capped at 3.
    assert_eq!(preview.scroll_top, 830.0);
}

#[test]
fn test_preview_scroll_is_applied_directly() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    // Halfway between the tags for lines 11 (400px) and 21 (800px).
    preview.scroll_top = 600.0;
    sync.on_preview_scroll(&preview, 0.0);
    sync.run_frame(0.0, &mut editor, &mut preview);

    assert_eq!(editor.scroll_top, 300.0);
    assert_eq!(editor.writes, 1);
    assert_eq!(sync.driver(10.0), Some(Driver::Preview));
}

// ============ Feedback suppression ============

#[test]
fn test_programmatic_writes_are_not_echoed_back() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    preview.scroll_top = 600.0;
    sync.on_preview_scroll(&preview, 0.0);
    sync.run_frame(0.0, &mut editor, &mut preview);

    // The editor moved because we moved it; sampling it schedules nothing.
    assert!(!sync.poll_editor(&editor));
    assert!(!sync.needs_frame());
    assert_eq!(preview.writes, 0);
}

#[test]
fn test_preview_echo_during_animation_is_ignored() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    editor.scroll_top = 1000.0;
    sync.poll_editor(&editor);
    sync.run_frame(0.0, &mut editor, &mut preview);

    assert!(sync.is_animating());
    assert!(!sync.on_preview_scroll(&preview, 5.0));
    assert!(sync.is_animating());
}

#[test]
fn test_locked_driver_blocks_other_side() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    preview.scroll_top = 600.0;
    sync.on_preview_scroll(&preview, 0.0);
    sync.run_frame(0.0, &mut editor, &mut preview);

    // A user scroll of the editor inside the preview lock is not synced.
    editor.scroll_top = 1200.0;
    assert!(sync.poll_editor(&editor));
    sync.run_frame(50.0, &mut editor, &mut preview);
    assert_eq!(preview.writes, 0);

    // After the lock expires the next sample goes through.
    editor.scroll_top = 1210.0;
    sync.poll_editor(&editor);
    settle(&mut sync, 200.0, &mut editor, &mut preview);
    assert!(preview.writes > 0);
}

#[test]
fn test_user_grabbing_preview_cancels_animation() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    editor.scroll_top = 1000.0;
    sync.poll_editor(&editor);
    sync.run_frame(0.0, &mut editor, &mut preview);
    assert!(sync.is_animating());

    preview.scroll_top = 100.0;
    assert!(sync.on_preview_scroll(&preview, 16.0));

    assert!(!sync.is_animating());
    assert_eq!(sync.driver(16.0), None);
}

// ============ Cursor click ============

#[test]
fn test_cursor_click_keeps_viewport_fraction() {
    let (mut editor, mut preview) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    // Line 31 sits 150px into a 300px editor viewport scrolled to 450.
    editor.scroll_top = 450.0;
    let target = sync.sync_cursor_click(31, 0.0, &editor, &mut preview);

    // Tagged at 1200 in the preview; half the viewport above it.
    assert_eq!(target, Some(1050.0));
    assert_eq!(preview.scroll_top, 1050.0);
    assert_eq!(sync.driver(0.0), Some(Driver::Editor));
}

// ============ Lifecycle ============

#[test]
fn test_dispose_cancels_pending_frames() {
    let (mut editor, _) = panes();
    let mut sync = ScrollSync::new(ScrollSyncSettings::default());

    editor.scroll_top = 500.0;
    sync.poll_editor(&editor);
    assert!(sync.needs_frame());

    sync.dispose();

    assert!(!sync.needs_frame());
    assert_eq!(sync.driver(0.0), None);
}
