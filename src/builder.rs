//! Unified cache builder for the three eviction policies.
//!
//! Selects an engine by name and capacity while keeping the per-engine types
//! out of caller code.
//!
//! ## Example
//!
//! ```
//! use tiercache::builder::{CacheBuilder, CachePolicy};
//!
//! let cache = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lru);
//! cache.insert(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policy::alfu::{AlfuCache, DEFAULT_DECAY_INTERVAL};
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::traits::ConcurrentCache;

/// Capacity used when a caller asks for zero.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Available eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Recency-based eviction.
    Lru,
    /// Frequency-tiered eviction.
    Lfu,
    /// Frequency-tiered eviction with background decay of stale frequency.
    Alfu,
}

/// Unified cache wrapper with a consistent API regardless of policy.
///
/// Building an [`Alfu`](CachePolicy::Alfu) cache starts its decay worker;
/// dropping the wrapper stops it.
#[derive(Debug)]
pub struct Cache<K, V> {
    inner: CacheInner<K, V>,
}

#[derive(Debug)]
enum CacheInner<K, V> {
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
    Alfu(AlfuCache<K, V>),
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Debug + Send + Sync + 'static,
{
    /// Inserts or refreshes a key per the engine's promotion rule.
    pub fn insert(&self, key: K, value: V) {
        match &self.inner {
            CacheInner::Lru(lru) => {
                lru.insert(key, value);
            },
            CacheInner::Lfu(lfu) => {
                lfu.insert(key, value);
            },
            CacheInner::Alfu(alfu) => {
                alfu.insert(key, value);
            },
        }
    }

    /// Returns a clone of the value, or `None` if absent. Never promotes.
    pub fn get(&self, key: &K) -> Option<V> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.get(key),
            CacheInner::Lfu(lfu) => lfu.get(key),
            CacheInner::Alfu(alfu) => alfu.get(key),
        }
    }

    /// Removes a key; absent keys are a no-op.
    pub fn remove(&self, key: &K) {
        match &self.inner {
            CacheInner::Lru(lru) => {
                lru.remove(key);
            },
            CacheInner::Lfu(lfu) => {
                lfu.remove(key);
            },
            CacheInner::Alfu(alfu) => {
                alfu.remove(key);
            },
        }
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.len(),
            CacheInner::Lfu(lfu) => lfu.len(),
            CacheInner::Alfu(alfu) => alfu.len(),
        }
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.capacity(),
            CacheInner::Lfu(lfu) => lfu.capacity(),
            CacheInner::Alfu(alfu) => alfu.capacity(),
        }
    }

    /// Returns the next eviction candidate's key.
    pub fn last_key(&self) -> Option<K> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.last_key(),
            CacheInner::Lfu(lfu) => lfu.last_key(),
            CacheInner::Alfu(alfu) => alfu.last_key(),
        }
    }

    /// Logs the ordering dump; see
    /// [`ConcurrentCache::order_print`](crate::traits::ConcurrentCache::order_print).
    pub fn order_print(&self, level: u32) {
        match &self.inner {
            CacheInner::Lru(lru) => lru.order_print(level),
            CacheInner::Lfu(lfu) => ConcurrentCache::order_print(lfu, level),
            CacheInner::Alfu(alfu) => ConcurrentCache::order_print(alfu, level),
        }
    }

    /// Drops all entries; capacity and (for ALFU) the worker are unchanged.
    pub fn clear(&self) {
        match &self.inner {
            CacheInner::Lru(lru) => lru.clear(),
            CacheInner::Lfu(lfu) => lfu.clear(),
            CacheInner::Alfu(alfu) => alfu.clear(),
        }
    }
}

/// Builder for cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    decay_interval: Duration,
}

impl CacheBuilder {
    /// Creates a builder for a cache of `capacity` entries.
    ///
    /// A capacity of 0 is replaced by [`DEFAULT_CAPACITY`] at build time;
    /// use [`try_build`](Self::try_build) to reject it instead.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            decay_interval: DEFAULT_DECAY_INTERVAL,
        }
    }

    /// Overrides the adaptive engine's sweep interval (default 24 hours).
    ///
    /// Ignored by the other policies.
    pub fn decay_interval(mut self, interval: Duration) -> Self {
        self.decay_interval = interval;
        self
    }

    /// Builds a cache with the given policy, coercing a zero capacity to
    /// [`DEFAULT_CAPACITY`].
    ///
    /// # Example
    ///
    /// ```
    /// use tiercache::builder::{CacheBuilder, CachePolicy, DEFAULT_CAPACITY};
    ///
    /// let cache = CacheBuilder::new(0).build::<u64, u64>(CachePolicy::Lfu);
    /// assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Cache<K, V>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        V: Clone + Debug + Send + Sync + 'static,
    {
        let capacity = if self.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity
        };
        let inner = match policy {
            CachePolicy::Lru => CacheInner::Lru(LruCache::new(capacity)),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::new(capacity)),
            CachePolicy::Alfu => {
                CacheInner::Alfu(AlfuCache::with_interval(capacity, self.decay_interval))
            },
        };
        Cache { inner }
    }

    /// Builds a cache, rejecting a zero capacity instead of coercing it.
    pub fn try_build<K, V>(self, policy: CachePolicy) -> Result<Cache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        V: Clone + Debug + Send + Sync + 'static,
    {
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity must be greater than zero"));
        }
        Ok(self.build(policy))
    }

    /// Builds a cache behind the [`ConcurrentCache`] trait object.
    pub fn boxed<K, V>(self, policy: CachePolicy) -> Box<dyn ConcurrentCache<K, V>>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        V: Clone + Debug + Send + Sync + 'static,
    {
        let capacity = if self.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity
        };
        match policy {
            CachePolicy::Lru => Box::new(LruCache::new(capacity)),
            CachePolicy::Lfu => Box::new(LfuCache::new(capacity)),
            CachePolicy::Alfu => Box::new(AlfuCache::with_interval(capacity, self.decay_interval)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_policies_basic_ops() {
        let policies = [CachePolicy::Lru, CachePolicy::Lfu, CachePolicy::Alfu];
        for policy in policies {
            let cache = CacheBuilder::new(10).build::<u64, String>(policy);

            cache.insert(1, "one".to_string());
            cache.insert(2, "two".to_string());

            assert_eq!(cache.get(&1), Some("one".to_string()));
            assert_eq!(cache.get(&2), Some("two".to_string()));
            assert_eq!(cache.get(&3), None);
            assert_eq!(cache.len(), 2);
            assert!(!cache.is_empty());

            cache.insert(1, "ONE".to_string());
            assert_eq!(cache.get(&1), Some("ONE".to_string()));

            cache.remove(&2);
            assert_eq!(cache.get(&2), None);
            cache.order_print(0);

            cache.clear();
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn zero_capacity_coerces_to_default() {
        for policy in [CachePolicy::Lru, CachePolicy::Lfu, CachePolicy::Alfu] {
            let cache = CacheBuilder::new(0).build::<u64, u64>(policy);
            assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
        }
    }

    #[test]
    fn requested_capacity_is_honored_by_every_policy() {
        for policy in [CachePolicy::Lru, CachePolicy::Lfu, CachePolicy::Alfu] {
            let cache = CacheBuilder::new(7).build::<u64, u64>(policy);
            assert_eq!(cache.capacity(), 7);
        }
    }

    #[test]
    fn try_build_rejects_zero_capacity() {
        let err = CacheBuilder::new(0)
            .try_build::<u64, u64>(CachePolicy::Lru)
            .unwrap_err();
        assert!(err.to_string().contains("capacity"));

        assert!(CacheBuilder::new(1)
            .try_build::<u64, u64>(CachePolicy::Lfu)
            .is_ok());
    }

    #[test]
    fn lru_end_to_end_scenario() {
        let cache = CacheBuilder::new(2).build::<String, i32>(CachePolicy::Lru);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
        assert_eq!(cache.last_key(), Some("b".to_string()));
    }

    #[test]
    fn boxed_returns_a_usable_trait_object() {
        let cache = CacheBuilder::new(4).boxed::<u64, u64>(CachePolicy::Lfu);
        cache.insert(1, 10);
        cache.insert(1, 11);
        cache.insert(2, 20);

        assert_eq!(cache.get(&1), Some(11));
        assert_eq!(cache.last_key(), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn alfu_worker_is_scoped_to_the_cache() {
        let cache = CacheBuilder::new(4)
            .decay_interval(Duration::from_millis(10))
            .build::<u64, u64>(CachePolicy::Alfu);
        cache.insert(1, 1);
        // Dropping must stop and join the decay worker without waiting for
        // the next tick.
        drop(cache);
    }
}
