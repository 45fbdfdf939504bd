//! Frequency-tiered eviction engine.
//!
//! The tier manager keeps one [`RecencyStore`] per frequency level and two
//! indexes over them: `levels` (key → current level) and `occupied` (sorted
//! set of non-empty levels). A key enters at level 1 and climbs one level per
//! re-insert; eviction takes the *tail* of the minimum occupied tier, so ties
//! within the least-frequent tier break by recency.
//!
//! ## Architecture
//!
//! ```text
//!   levels (FxHashMap<K, u32>)        tiers (FxHashMap<u32, RecencyStore>)
//!   ┌─────────┬───────┐
//!   │  "a"    │   3   │──────┐        level 3: head ─► [a] ◄─ tail
//!   │  "b"    │   1   │──┐   └──────►
//!   │  "c"    │   1   │──┼──────────► level 1: head ─► [c] ◄──► [b] ◄─ tail
//!   └─────────┴───────┘  └─────────┘                             ▲
//!                                                      evict first
//!   occupied: {1, 3}      min_level: 1
//! ```
//!
//! Frequency changes only through [`insert`](LfuCache::insert);
//! [`get`](LfuCache::get) neither increments a key's level nor moves it
//! within its tier. A promotion physically moves the entry: it is removed
//! from one tier's store and recreated in the next tier's store.
//!
//! Minimum-level resolution never recurses: it is a range scan over the
//! `occupied` set, bounded by the number of occupied levels, and a scan that
//! comes up empty while keys remain tracked is surfaced as an
//! internal-consistency error rather than looping.
//!
//! `LfuCore` is the single-threaded core; `LfuCache` wraps it in one
//! manager-wide `RwLock`, held for the whole of each call so no reader or
//! writer observes a half-moved entry. The adaptive engine in
//! [`policy::alfu`](crate::policy::alfu) drives [`LfuCore::decay_sweep`]
//! from a background thread under that same lock.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ds::RecencyStore;
use crate::error::InvariantError;
use crate::traits::ConcurrentCache;

/// Reports an internal-consistency failure without tearing anything down:
/// asserts in debug builds, logs at error level in release.
fn surface_inconsistency(what: &str) {
    let err = InvariantError::new(what);
    debug_assert!(false, "{err}");
    tracing::error!(error = %err, "tier bookkeeping inconsistent");
}

/// Single-threaded frequency-tier manager.
///
/// Exclusive access is assumed; [`LfuCache`] and
/// [`AlfuCache`](crate::policy::alfu::AlfuCache) provide the locking.
#[derive(Debug)]
pub struct LfuCore<K, V> {
    tiers: FxHashMap<u32, RecencyStore<K, V>>,
    levels: FxHashMap<K, u32>,
    occupied: BTreeSet<u32>,
    /// Lowest occupied level; 0 while the manager is empty.
    min_level: u32,
    capacity: usize,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty manager bounded to `capacity` tracked keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            tiers: FxHashMap::default(),
            levels: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            occupied: BTreeSet::new(),
            min_level: 0,
            capacity,
        }
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if `key` is tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.levels.contains_key(key)
    }

    /// Returns the current frequency level of `key`.
    pub fn level_of(&self, key: &K) -> Option<u32> {
        self.levels.get(key).copied()
    }

    /// Returns the lowest occupied level, or `None` while empty.
    pub fn min_level(&self) -> Option<u32> {
        if self.min_level == 0 {
            None
        } else {
            Some(self.min_level)
        }
    }

    /// Returns the value for `key` without touching frequency or recency.
    pub fn get(&self, key: &K) -> Option<&V> {
        let level = *self.levels.get(key)?;
        self.tiers.get(&level)?.get(key)
    }

    /// Inserts or refreshes `key`.
    ///
    /// A new key starts at level 1; if the tracked-key count has now reached
    /// capacity, the tail of the minimum occupied tier is evicted and its
    /// key returned (when every other key sits in a higher tier, that tail
    /// is the key just inserted). An existing key moves to `level + 1` with
    /// the new value.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(&level) = self.levels.get(&key) {
            self.promote(key, level, value);
            return None;
        }

        self.levels.insert(key.clone(), 1);
        self.tier_insert(1, key, value);
        self.min_level = 1;

        if self.levels.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let level = self.levels.remove(key)?;
        let Some(tier) = self.tiers.get_mut(&level) else {
            surface_inconsistency("key tracked at a level with no tier");
            return None;
        };
        let value = tier.remove(key);
        if tier.is_empty() {
            self.drop_tier(level);
        }
        value
    }

    /// Returns the next eviction candidate: the minimum tier's tail key.
    pub fn back_key(&self) -> Option<&K> {
        self.tiers.get(&self.min_level)?.back_key()
    }

    /// Drops all keys and tiers.
    pub fn clear(&mut self) {
        self.tiers.clear();
        self.levels.clear();
        self.occupied.clear();
        self.min_level = 0;
    }

    /// Demotes stale tier tails, halving their level; returns the number of
    /// demoted entries.
    ///
    /// One pass over the occupied levels in ascending order, skipping the
    /// minimum tier (already at the eviction floor). Per tier, only the tail
    /// entry is inspected; if its last update is at least `threshold` before
    /// `now`, it moves to `max(1, level / 2)` with a fresh timestamp. A tier
    /// with several stale entries therefore converges over several sweeps,
    /// and one sweep costs O(occupied tiers), not O(keys). The minimum level
    /// is lowered when a demotion lands below it.
    pub fn decay_sweep(&mut self, now: Instant, threshold: Duration) -> usize {
        let start_min = self.min_level;
        let sweep_levels: Vec<u32> = self.occupied.iter().copied().collect();
        let mut demoted = 0usize;

        for level in sweep_levels {
            if level == start_min {
                continue;
            }
            let Some(tier) = self.tiers.get(&level) else {
                continue;
            };
            let Some((key, _, last_update)) = tier.back_entry() else {
                continue;
            };
            if now.saturating_duration_since(last_update) < threshold {
                continue;
            }
            let key = key.clone();

            let (value, emptied) = {
                let Some(tier) = self.tiers.get_mut(&level) else {
                    continue;
                };
                let value = tier.remove(&key);
                (value, tier.is_empty())
            };
            let Some(value) = value else {
                continue;
            };
            if emptied {
                self.drop_tier_links_only(level);
            }

            let dest = (level / 2).max(1);
            self.levels.insert(key.clone(), dest);
            self.tier_insert(dest, key, value);
            if self.min_level == 0 || dest < self.min_level {
                self.min_level = dest;
            }
            demoted += 1;
        }
        demoted
    }

    /// Validates tier/index/min-level bookkeeping and every tier's chain.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} keys tracked with capacity {}",
                self.len(),
                self.capacity
            )));
        }

        let tier_keys: BTreeSet<u32> = self.tiers.keys().copied().collect();
        if tier_keys != self.occupied {
            return Err(InvariantError::new("occupied set out of sync with tiers"));
        }

        let mut tiered = 0usize;
        for (&level, tier) in &self.tiers {
            if level == 0 {
                return Err(InvariantError::new("tier at level 0"));
            }
            if tier.is_empty() {
                return Err(InvariantError::new(format!("empty tier {level} retained")));
            }
            tier.check_invariants()?;
            tiered += tier.len();
            for (key, _, _) in tier.iter() {
                if self.levels.get(key) != Some(&level) {
                    return Err(InvariantError::new(format!(
                        "tier {level} holds a key tracked at another level"
                    )));
                }
            }
        }
        if tiered != self.levels.len() {
            return Err(InvariantError::new(format!(
                "tiers hold {} entries but {} keys are tracked",
                tiered,
                self.levels.len()
            )));
        }

        match self.occupied.first() {
            Some(&lowest) if self.min_level != lowest => Err(InvariantError::new(format!(
                "min_level {} but lowest occupied tier is {}",
                self.min_level, lowest
            ))),
            None if self.min_level != 0 => Err(InvariantError::new(
                "min_level set while no tier is occupied",
            )),
            _ => Ok(()),
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("tier manager invariant violated: {err}");
        }
    }

    /// First occupied, non-empty level at or above `start`.
    ///
    /// Bounded by the occupied set; `None` means no such level exists.
    fn next_occupied_level(&self, start: u32) -> Option<u32> {
        self.occupied
            .range(start..)
            .copied()
            .find(|level| self.tiers.get(level).is_some_and(|tier| !tier.is_empty()))
    }

    fn promote(&mut self, key: K, level: u32, value: V) {
        let emptied = match self.tiers.get_mut(&level) {
            Some(tier) => {
                tier.remove(&key);
                tier.is_empty()
            },
            None => {
                surface_inconsistency("key tracked at a level with no tier");
                false
            },
        };
        if emptied {
            self.drop_tier_links_only(level);
        }

        let next = level.saturating_add(1);
        self.levels.insert(key.clone(), next);
        self.tier_insert(next, key, value);

        if emptied && self.min_level == level {
            self.resolve_min_from(level);
        }
    }

    fn evict_one(&mut self) -> Option<K> {
        let min = self.min_level;
        if min == 0 {
            surface_inconsistency("eviction requested on an empty manager");
            return None;
        }
        let Some(tier) = self.tiers.get_mut(&min) else {
            surface_inconsistency("min_level names a missing tier");
            return None;
        };
        let Some((victim, _)) = tier.pop_back() else {
            surface_inconsistency("min_level names an empty tier");
            return None;
        };
        self.levels.remove(&victim);
        if self.tiers.get(&min).is_some_and(|tier| tier.is_empty()) {
            self.drop_tier(min);
        }
        Some(victim)
    }

    fn tier_insert(&mut self, level: u32, key: K, value: V) {
        let capacity = self.capacity;
        let tier = self
            .tiers
            .entry(level)
            .or_insert_with(|| RecencyStore::new(capacity));
        let evicted = tier.insert(key, value);
        debug_assert!(evicted.is_none(), "tier store evicted on its own");
        self.occupied.insert(level);
    }

    /// Removes an emptied tier and re-resolves `min_level` if it pointed there.
    fn drop_tier(&mut self, level: u32) {
        self.drop_tier_links_only(level);
        if self.min_level == level {
            self.resolve_min_from(level);
        }
    }

    fn drop_tier_links_only(&mut self, level: u32) {
        self.tiers.remove(&level);
        self.occupied.remove(&level);
    }

    fn resolve_min_from(&mut self, start: u32) {
        self.min_level = match self.next_occupied_level(start) {
            Some(level) => level,
            None => {
                if !self.levels.is_empty() {
                    surface_inconsistency("keys tracked but no occupied tier found");
                }
                0
            },
        };
    }
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Debug,
{
    /// Logs every tier's ordering, lowest level first, one info event per
    /// entry.
    pub fn order_print(&self) {
        for &level in &self.occupied {
            if let Some(tier) = self.tiers.get(&level) {
                for (key, value, ts) in tier.iter() {
                    tracing::info!(
                        key = ?key,
                        value = ?value,
                        tier = level,
                        age_secs = ts.elapsed().as_secs(),
                        "cache entry"
                    );
                }
            }
        }
    }
}

/// Thread-safe LFU cache: one manager-wide lock around [`LfuCore`].
///
/// Reads (`get`, `len`, `last_key`, `level_of`, `order_print`) take the
/// shared lock; every mutation takes the exclusive lock for the whole call,
/// nested tier surgery included.
///
/// ```
/// use tiercache::policy::lfu::LfuCache;
///
/// let cache = LfuCache::new(16);
/// cache.insert("a", 1);
/// cache.insert("a", 1); // promotes to level 2
/// cache.insert("b", 2);
///
/// assert_eq!(cache.level_of(&"a"), Some(2));
/// assert_eq!(cache.last_key(), Some("b")); // lowest tier, least recent
/// ```
#[derive(Debug)]
pub struct LfuCache<K, V> {
    inner: RwLock<LfuCore<K, V>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an engine bounded to `capacity` tracked keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(LfuCore::new(capacity)),
        }
    }

    /// Inserts or refreshes `key`; returns the evicted key, if any.
    pub fn insert(&self, key: K, value: V) -> Option<K> {
        let mut core = self.inner.write();
        core.insert(key, value)
    }

    /// Returns a clone of the value; no frequency or recency change.
    pub fn get(&self, key: &K) -> Option<V> {
        let core = self.inner.read();
        core.get(key).cloned()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut core = self.inner.write();
        core.remove(key)
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        let core = self.inner.read();
        core.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        let core = self.inner.read();
        core.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        let core = self.inner.read();
        core.capacity()
    }

    /// Returns `true` if `key` is tracked.
    pub fn contains(&self, key: &K) -> bool {
        let core = self.inner.read();
        core.contains(key)
    }

    /// Returns the current frequency level of `key`.
    pub fn level_of(&self, key: &K) -> Option<u32> {
        let core = self.inner.read();
        core.level_of(key)
    }

    /// Returns the next eviction candidate's key.
    pub fn last_key(&self) -> Option<K> {
        let core = self.inner.read();
        core.back_key().cloned()
    }

    /// Drops all keys and tiers.
    pub fn clear(&self) {
        let mut core = self.inner.write();
        core.clear()
    }

    /// Validates the manager and every tier.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let core = self.inner.read();
        core.check_invariants()
    }
}

impl<K, V> ConcurrentCache<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Debug + Send + Sync,
{
    fn insert(&self, key: K, value: V) {
        LfuCache::insert(self, key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        LfuCache::get(self, key)
    }

    fn remove(&self, key: &K) {
        LfuCache::remove(self, key);
    }

    fn len(&self) -> usize {
        LfuCache::len(self)
    }

    fn last_key(&self) -> Option<K> {
        LfuCache::last_key(self)
    }

    fn order_print(&self, _level: u32) {
        let core = self.inner.read();
        core.order_print();
    }
}
