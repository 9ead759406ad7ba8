//! Per-frame coalescing of scheduled work.
//!
//! Hosts own the real clock (animation frames, timers). The engine only
//! records which sources asked for a frame; however many times a source
//! schedules before the next tick, its callback runs once.

/// Sources that can ask for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    EditorSync,
    PreviewSync,
    Animation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameQueue {
    pending: Vec<FrameSource>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when `source` already has a frame pending.
    pub fn schedule(&mut self, source: FrameSource) -> bool {
        if self.pending.contains(&source) {
            return false;
        }
        self.pending.push(source);
        true
    }

    pub fn is_pending(&self, source: FrameSource) -> bool {
        self.pending.contains(&source)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn cancel(&mut self, source: FrameSource) {
        self.pending.retain(|pending| *pending != source);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Everything due this tick, in scheduling order. Sources scheduled while
    /// the batch runs land in the next tick.
    pub fn take_due(&mut self) -> Vec<FrameSource> {
        std::mem::take(&mut self.pending)
    }
}
