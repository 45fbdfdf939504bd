//! # Cache contract
//!
//! One capability trait shared by all three eviction engines, so callers can
//! swap strategy without code change.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌─────────────────────────────────────────┐
//!                  │          ConcurrentCache<K, V>          │
//!                  │                                         │
//!                  │  insert(&self, K, V)                    │
//!                  │  get(&self, &K) → Option<V>             │
//!                  │  remove(&self, &K)                      │
//!                  │  len(&self) → usize                     │
//!                  │  last_key(&self) → Option<K>            │
//!                  │  order_print(&self, u32)                │
//!                  └──────────────────┬──────────────────────┘
//!                                     │
//!              ┌──────────────────────┼──────────────────────┐
//!              ▼                      ▼                      ▼
//!     ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//!     │  LruCache<K,V>  │   │  LfuCache<K,V>  │   │ AlfuCache<K,V>  │
//!     │  recency only   │   │ frequency tiers │   │ tiers + decay   │
//!     └─────────────────┘   └─────────────────┘   └─────────────────┘
//! ```
//!
//! All methods take `&self`: every engine carries its own lock and the trait
//! requires `Send + Sync`, so one instance can be shared across threads
//! (typically behind an `Arc`, or as a `Box<dyn ConcurrentCache<K, V>>` from
//! [`CacheBuilder::boxed`](crate::builder::CacheBuilder::boxed)).
//!
//! ## Reads never promote
//!
//! Across every engine, [`get`](ConcurrentCache::get) changes neither
//! recency nor frequency. Promotion, whether to the head of a recency chain
//! or to the next frequency tier, happens only on
//! [`insert`](ConcurrentCache::insert). This diverges from textbook LRU/LFU
//! on purpose: the eviction candidate is the least recently *written* key.

/// Shared contract of the LRU, LFU, and adaptive-LFU engines.
///
/// # Example
///
/// ```
/// use tiercache::builder::{CacheBuilder, CachePolicy};
/// use tiercache::traits::ConcurrentCache;
///
/// fn warm(cache: &dyn ConcurrentCache<u64, String>, rows: &[(u64, String)]) {
///     for (key, value) in rows {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let cache = CacheBuilder::new(100).boxed::<u64, String>(CachePolicy::Lfu);
/// warm(cache.as_ref(), &[(1, "one".into()), (2, "two".into())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait ConcurrentCache<K, V>: Send + Sync {
    /// Inserts or refreshes a key, promoting it per the engine's policy.
    ///
    /// May evict another entry (or, at capacity, the inserted one; see the
    /// engine docs) to keep `len() <= capacity`.
    fn insert(&self, key: K, value: V);

    /// Returns a clone of the value, or `None` if absent.
    ///
    /// Never promotes: repeated reads do not change which key is evicted
    /// next.
    fn get(&self, key: &K) -> Option<V>;

    /// Removes a key. Absent keys are a no-op, not an error.
    fn remove(&self, key: &K);

    /// Returns the number of cached entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the next eviction candidate's key.
    ///
    /// For the tiered engines this is the tail of the minimum occupied
    /// frequency tier.
    fn last_key(&self) -> Option<K>;

    /// Emits a human-readable ordering dump through `tracing` at info level.
    ///
    /// Diagnostic only. The recency engine stamps each line with `level` as
    /// its tier label; the tiered engines print every tier and ignore the
    /// argument.
    fn order_print(&self, level: u32);
}
