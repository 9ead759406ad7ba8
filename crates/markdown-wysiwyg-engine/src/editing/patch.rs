use crate::editing::Selection;

/// Result of applying a command or a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Inserted ranges in post-edit offsets
    pub changed: Vec<std::ops::Range<usize>>,
    pub new_selection: Selection,
    pub version: u64,
}
