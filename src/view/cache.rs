//! Time-bounded cache of rendered boards.
//!
//! Entries are immutable once built, so readers share them through `Arc`
//! without locking. Any change to the project clears the whole cache.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use super::cursor::ViewKey;
use super::render::RenderedView;

/// Default expiry of a rendered board.
pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

const MAX_ENTRIES: u64 = 1_024;

#[derive(Clone)]
pub struct ViewCache {
    inner: Cache<ViewKey, Arc<RenderedView>>,
}

impl std::fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, key: &ViewKey) -> Option<Arc<RenderedView>> {
        self.inner.get(key)
    }

    /// Return the cached board for `key`, rendering and storing it on a miss.
    /// A cached board is returned exactly as stored; it is not re-sorted.
    pub fn get_or_render<E>(
        &self,
        key: ViewKey,
        render: impl FnOnce() -> Result<RenderedView, E>,
    ) -> Result<Arc<RenderedView>, E> {
        if let Some(hit) = self.inner.get(&key) {
            debug!(%key, "View cache hit");
            return Ok(hit);
        }
        debug!(%key, "View cache miss");
        let view = Arc::new(render()?);
        self.inner.insert(key, Arc::clone(&view));
        Ok(view)
    }

    pub fn invalidate_all(&self) {
        debug!("View cache cleared");
        self.inner.invalidate_all();
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::cursor::{SortColumn, SortOrder};
    use std::cell::Cell;

    fn key(sprint: u32) -> ViewKey {
        ViewKey {
            sprint,
            scrum: 1,
            column: SortColumn::Developer,
            order: SortOrder::Ascending,
        }
    }

    fn empty_view(sprint: u32) -> RenderedView {
        RenderedView {
            sprint,
            scrum: 1,
            column: SortColumn::Developer,
            order: SortOrder::Ascending,
            tasks: Vec::new(),
            blockers: Vec::new(),
        }
    }

    #[test]
    fn test_get_or_render_renders_once() {
        let cache = ViewCache::default();
        let calls = Cell::new(0);
        let render = || {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(empty_view(1))
        };

        let first = cache.get_or_render(key(1), render).unwrap();
        let second = cache
            .get_or_render(key(1), || -> Result<RenderedView, ()> { unreachable!("cached") })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_render_error_is_not_cached() {
        let cache = ViewCache::default();
        let err = cache.get_or_render(key(1), || Err::<RenderedView, _>("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn test_invalidate_all_clears_every_key() {
        let cache = ViewCache::default();
        cache.get_or_render(key(1), || Ok::<_, ()>(empty_view(1))).unwrap();
        cache.get_or_render(key(2), || Ok::<_, ()>(empty_view(2))).unwrap();
        cache.invalidate_all();
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = ViewCache::new(Duration::from_millis(50));
        cache.get_or_render(key(1), || Ok::<_, ()>(empty_view(1))).unwrap();
        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get(&key(1)).is_none());
    }
}
