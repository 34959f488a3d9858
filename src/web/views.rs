//! In-memory home for live comment views.
//!
//! Each browser gets an opaque `qb_view` cookie; the registry keeps one
//! [`CommentTreeView`] per (cookie, post) pair so expansion state, open
//! composers and notices survive the redirect after every form post. Entries
//! idle for longer than the configured timeout are dropped, and the least
//! recently used entry is dropped when the registry is full. Dropped views
//! are deactivated so a store call still in flight for them is ignored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tokio_util::sync::CancellationToken;

use crate::comments::CommentTreeView;

pub type SharedView = Arc<Mutex<CommentTreeView>>;

/// Lock a shared view, recovering from poisoning.
pub fn lock_view(view: &SharedView) -> MutexGuard<'_, CommentTreeView> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fresh value for the view cookie.
pub fn generate_view_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub view_id: String,
    pub post_id: i64,
}

impl ViewKey {
    #[must_use]
    pub fn new(view_id: impl Into<String>, post_id: i64) -> Self {
        Self {
            view_id: view_id.into(),
            post_id,
        }
    }
}

#[derive(Debug)]
struct Entry {
    view: SharedView,
    last_used: Instant,
}

#[derive(Debug)]
pub struct ViewRegistry {
    entries: Mutex<HashMap<ViewKey, Entry>>,
    capacity: usize,
    idle_timeout: Duration,
}

impl ViewRegistry {
    #[must_use]
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            idle_timeout,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ViewKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live view and mark it used.
    pub fn get(&self, key: &ViewKey) -> Option<SharedView> {
        let mut entries = self.entries();
        let idle_timeout = self.idle_timeout;
        let expired = entries
            .get(key)
            .is_some_and(|e| e.last_used.elapsed() >= idle_timeout);
        if expired {
            if let Some(entry) = entries.remove(key) {
                lock_view(&entry.view).deactivate();
            }
            return None;
        }
        entries.get_mut(key).map(|entry| {
            entry.last_used = Instant::now();
            Arc::clone(&entry.view)
        })
    }

    /// Return the view for `key`, creating it with `make` if absent.
    pub fn get_or_insert_with<F>(&self, key: ViewKey, make: F) -> SharedView
    where
        F: FnOnce() -> CommentTreeView,
    {
        if let Some(view) = self.get(&key) {
            return view;
        }

        let mut entries = self.entries();
        // Another request may have inserted it since `get`.
        if let Some(entry) = entries.get_mut(&key) {
            entry.last_used = Instant::now();
            return Arc::clone(&entry.view);
        }

        Self::evict_expired_locked(&mut entries, self.idle_timeout);
        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            let Some(oldest) = oldest else { break };
            if let Some(entry) = entries.remove(&oldest) {
                lock_view(&entry.view).deactivate();
                tracing::debug!(post_id = oldest.post_id, "Evicted comment view");
            }
        }

        let view = Arc::new(Mutex::new(make()));
        entries.insert(
            key,
            Entry {
                view: Arc::clone(&view),
                last_used: Instant::now(),
            },
        );
        view
    }

    /// Drop every view of `post_id`, e.g. after the post is deleted.
    pub fn remove_post(&self, post_id: i64) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, entry| {
            if key.post_id == post_id {
                lock_view(&entry.view).deactivate();
                false
            } else {
                true
            }
        });
        before - entries.len()
    }

    /// Drop views idle past the timeout. Returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        Self::evict_expired_locked(&mut self.entries(), self.idle_timeout)
    }

    fn evict_expired_locked(entries: &mut HashMap<ViewKey, Entry>, idle_timeout: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| {
            if entry.last_used.elapsed() >= idle_timeout {
                lock_view(&entry.view).deactivate();
                false
            } else {
                true
            }
        });
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Periodically drop idle views until `shutdown` fires.
pub async fn run_view_sweeper(
    registry: Arc<ViewRegistry>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = registry.evict_expired();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = registry.len(), "Swept idle comment views");
                }
            }
            () = shutdown.cancelled() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_view(post_id: i64) -> CommentTreeView {
        CommentTreeView::new(post_id, 1, None, Vec::new(), CommentTreeView::next_epoch())
    }

    #[test]
    fn test_same_key_returns_same_view() {
        let registry = ViewRegistry::new(8, Duration::from_secs(60));
        let a = registry.get_or_insert_with(ViewKey::new("abc", 1), || make_view(1));
        lock_view(&a).expand(5);

        let b = registry.get_or_insert_with(ViewKey::new("abc", 1), || make_view(1));
        assert!(lock_view(&b).is_expanded(5));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_viewers_have_distinct_views() {
        let registry = ViewRegistry::new(8, Duration::from_secs(60));
        let a = registry.get_or_insert_with(ViewKey::new("abc", 1), || make_view(1));
        let b = registry.get_or_insert_with(ViewKey::new("xyz", 1), || make_view(1));
        lock_view(&a).expand(5);
        assert!(!lock_view(&b).is_expanded(5));
    }

    #[test]
    fn test_capacity_evicts_and_deactivates_oldest() {
        let registry = ViewRegistry::new(2, Duration::from_secs(60));
        let first = registry.get_or_insert_with(ViewKey::new("a", 1), || make_view(1));
        std::thread::sleep(Duration::from_millis(2));
        registry.get_or_insert_with(ViewKey::new("b", 1), || make_view(1));
        std::thread::sleep(Duration::from_millis(2));
        registry.get_or_insert_with(ViewKey::new("c", 1), || make_view(1));

        assert_eq!(registry.len(), 2);
        assert!(!lock_view(&first).is_active());
        assert!(registry.get(&ViewKey::new("a", 1)).is_none());
    }

    #[test]
    fn test_idle_views_expire() {
        let registry = ViewRegistry::new(8, Duration::from_millis(1));
        let view = registry.get_or_insert_with(ViewKey::new("a", 1), || make_view(1));
        std::thread::sleep(Duration::from_millis(5));

        assert!(registry.get(&ViewKey::new("a", 1)).is_none());
        assert!(!lock_view(&view).is_active());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_expired_sweeps_everything_idle() {
        let registry = ViewRegistry::new(8, Duration::from_millis(1));
        registry.get_or_insert_with(ViewKey::new("a", 1), || make_view(1));
        registry.get_or_insert_with(ViewKey::new("b", 2), || make_view(2));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.evict_expired(), 2);
    }

    #[test]
    fn test_remove_post_drops_only_that_post() {
        let registry = ViewRegistry::new(8, Duration::from_secs(60));
        registry.get_or_insert_with(ViewKey::new("a", 1), || make_view(1));
        registry.get_or_insert_with(ViewKey::new("b", 1), || make_view(1));
        registry.get_or_insert_with(ViewKey::new("a", 2), || make_view(2));

        assert_eq!(registry.remove_post(1), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_generated_view_ids_are_unique() {
        let a = generate_view_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, generate_view_id());
    }
}
