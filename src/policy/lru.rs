//! Recency-based eviction engine.
//!
//! `LruCache` is a thread-safe wrapper around one
//! [`RecencyStore`](crate::ds::RecencyStore): a `parking_lot::RwLock` scoped
//! to the single call, shared for reads, exclusive for anything that touches
//! the chain. Eviction order is pure promotion order, and promotion happens
//! only on [`insert`](LruCache::insert), never on [`get`](LruCache::get).
//!
//! ```
//! use tiercache::policy::lru::LruCache;
//!
//! let cache = LruCache::new(2);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.insert("c", 3); // evicts "a"
//!
//! assert_eq!(cache.get(&"a"), None);
//! assert_eq!(cache.get(&"c"), Some(3));
//! assert_eq!(cache.last_key(), Some("b"));
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

use parking_lot::RwLock;

use crate::ds::RecencyStore;
use crate::error::InvariantError;
use crate::traits::ConcurrentCache;

/// Thread-safe LRU cache over a single recency store.
#[derive(Debug)]
pub struct LruCache<K, V> {
    inner: RwLock<RecencyStore<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an engine bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(RecencyStore::new(capacity)),
        }
    }

    /// Inserts or refreshes `key` at the most-recent position.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn insert(&self, key: K, value: V) -> Option<K> {
        let mut store = self.inner.write();
        store.insert(key, value)
    }

    /// Returns a clone of the value without promoting the entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let store = self.inner.read();
        store.get(key).cloned()
    }

    /// Promotes `key` without changing its value; `false` if absent.
    pub fn touch(&self, key: &K) -> bool {
        let mut store = self.inner.write();
        store.touch(key)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut store = self.inner.write();
        store.remove(key)
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        let store = self.inner.read();
        store.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        let store = self.inner.read();
        store.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        let store = self.inner.read();
        store.capacity()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        let store = self.inner.read();
        store.contains(key)
    }

    /// Returns the most recently promoted key.
    pub fn front_key(&self) -> Option<K> {
        let store = self.inner.read();
        store.front_key().cloned()
    }

    /// Returns the eviction candidate's key.
    pub fn last_key(&self) -> Option<K> {
        let store = self.inner.read();
        store.back_key().cloned()
    }

    /// Returns the eviction candidate's key, value, and last-update time.
    pub fn last_entry(&self) -> Option<(K, V, Instant)> {
        let store = self.inner.read();
        store
            .back_entry()
            .map(|(key, value, ts)| (key.clone(), value.clone(), ts))
    }

    /// Returns the key following `key` toward the eviction end.
    pub fn next_key(&self, key: &K) -> Option<K> {
        let store = self.inner.read();
        store.next_key(key).cloned()
    }

    /// Returns the key preceding `key` toward the most-recent end.
    pub fn prev_key(&self, key: &K) -> Option<K> {
        let store = self.inner.read();
        store.prev_key(key).cloned()
    }

    /// Changes the capacity, evicting from the tail while over the bound.
    pub fn resize(&self, capacity: usize) {
        let mut store = self.inner.write();
        store.resize(capacity)
    }

    /// Drops all entries.
    pub fn clear(&self) {
        let mut store = self.inner.write();
        store.clear()
    }

    /// Validates the underlying chain/index structure.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let store = self.inner.read();
        store.check_invariants()
    }
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Debug,
{
    /// Logs the recency order head-to-tail, one info event per entry.
    ///
    /// `tier` is only a label to stamp on each line; a plain LRU instance
    /// has no tiers of its own.
    pub fn order_print(&self, tier: u32) {
        let store = self.inner.read();
        for (key, value, ts) in store.iter() {
            tracing::info!(
                key = ?key,
                value = ?value,
                tier,
                age_secs = ts.elapsed().as_secs(),
                "cache entry"
            );
        }
    }
}

impl<K, V> ConcurrentCache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Debug + Send + Sync,
{
    fn insert(&self, key: K, value: V) {
        LruCache::insert(self, key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        LruCache::get(self, key)
    }

    fn remove(&self, key: &K) {
        LruCache::remove(self, key);
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn last_key(&self) -> Option<K> {
        LruCache::last_key(self)
    }

    fn order_print(&self, level: u32) {
        LruCache::order_print(self, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn evicts_least_recently_written() {
        let cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.insert("c", 3), Some("a"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.last_key(), Some("b"));
    }

    #[test]
    fn reads_do_not_rescue_the_tail() {
        let cache = LruCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        for _ in 0..10 {
            cache.get(&"a");
        }
        assert_eq!(cache.last_key(), Some("a"));

        // A write does rescue it, and so does an explicit touch.
        cache.insert("a", 1);
        assert_eq!(cache.last_key(), Some("b"));
        assert_eq!(cache.front_key(), Some("a"));

        assert!(cache.touch(&"b"));
        assert_eq!(cache.last_key(), Some("c"));
        assert!(!cache.touch(&"gone"));
    }

    #[test]
    fn remove_then_get_reports_not_found() {
        let cache = LruCache::new(4);
        cache.insert(1u32, "one");
        cache.insert(2, "two");
        cache.insert(3, "three");

        assert_eq!(cache.remove(&2), Some("two"));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.remove(&2), None);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn traversal_and_metadata_accessors() {
        let cache = LruCache::new(4);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert!(cache.contains(&"a"));
        assert_eq!(cache.next_key(&"b"), Some("a"));
        assert_eq!(cache.prev_key(&"a"), Some("b"));

        let (key, value, _ts) = cache.last_entry().unwrap();
        assert_eq!(key, "a");
        assert_eq!(value, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.last_entry(), None);
    }

    #[test]
    fn resize_shrinks_from_the_eviction_end() {
        let cache = LruCache::new(4);
        for i in 0..4u32 {
            cache.insert(i, i);
        }
        cache.resize(2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&0), None);
        assert_eq!(cache.get(&3), Some(3));
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(LruCache::new(64));
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100u64 {
                        cache.insert(t * 100 + i, i);
                        let _ = cache.get(&(t * 100 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 64);
        assert!(cache.check_invariants().is_ok());
    }
}
