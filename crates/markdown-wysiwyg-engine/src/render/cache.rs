use std::num::NonZeroUsize;

use lru::LruCache;

/// Rendered output keyed by its source (and render options).
pub type RenderCache = LruCache<String, String>;

/// A cache holding at most `capacity` entries. A zero capacity still keeps
/// the most recent entry.
pub fn render_cache(capacity: usize) -> RenderCache {
    let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
    LruCache::new(capacity)
}
