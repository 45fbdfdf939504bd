//! Adaptive frequency-tiered eviction engine.
//!
//! `AlfuCache` is the tier manager of [`policy::lfu`](crate::policy::lfu)
//! plus one background thread that periodically cools stale frequency: every
//! interval it takes the manager's exclusive lock and runs
//! [`LfuCore::decay_sweep`], halving the level of each non-minimum tier
//! whose tail entry has not been written for at least the interval. A key
//! that was hot last week but idle since gradually slides back toward the
//! eviction floor instead of squatting in a high tier forever.
//!
//! ```text
//!   foreground threads                      decay worker (1 per instance)
//!     insert/get/remove ──┐               ┌── every `interval`:
//!                         ▼               ▼     write-lock, one sweep
//!                ┌─────────────────────────────┐
//!                │   Arc<RwLock<LfuCore<K,V>>> │
//!                └─────────────────────────────┘
//! ```
//!
//! The sweep holds the exclusive lock for its full duration, so it is
//! strictly serialized against foreground calls; its cost is bounded by the
//! number of occupied tiers (tail-only inspection), not by the number of
//! keys. The worker is bound to the cache's lifetime: dropping the cache
//! raises a stop flag, wakes the worker, and joins it, so no periodic task
//! outlives its state.
//!
//! Like the other engines, reads never promote and never prevent decay; only
//! [`insert`](AlfuCache::insert) refreshes an entry's timestamp and level.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};

use crate::error::InvariantError;
use crate::policy::lfu::LfuCore;
use crate::traits::ConcurrentCache;

/// Reference decay interval: one sweep per day, and a tier tail must be a
/// day idle to be demoted.
pub const DEFAULT_DECAY_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Stop flag + wakeup signal shared with the worker thread.
#[derive(Debug, Default)]
struct WorkerSignal {
    stop: Mutex<bool>,
    wake: Condvar,
}

/// Thread-safe adaptive LFU cache with background frequency decay.
///
/// ```
/// use std::time::Duration;
/// use tiercache::policy::alfu::AlfuCache;
///
/// let cache = AlfuCache::with_interval(16, Duration::from_secs(60));
/// cache.insert("a", 1);
/// cache.insert("a", 1); // level 2
/// assert_eq!(cache.level_of(&"a"), Some(2));
/// // dropping the cache stops and joins the decay worker
/// ```
#[derive(Debug)]
pub struct AlfuCache<K, V> {
    core: Arc<RwLock<LfuCore<K, V>>>,
    signal: Arc<WorkerSignal>,
    worker: Option<JoinHandle<()>>,
    interval: Duration,
}

impl<K, V> AlfuCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates an engine with the daily [`DEFAULT_DECAY_INTERVAL`].
    pub fn new(capacity: usize) -> Self {
        Self::with_interval(capacity, DEFAULT_DECAY_INTERVAL)
    }

    /// Creates an engine sweeping (and judging staleness) every `interval`.
    pub fn with_interval(capacity: usize, interval: Duration) -> Self {
        let core = Arc::new(RwLock::new(LfuCore::new(capacity)));
        let signal = Arc::new(WorkerSignal::default());
        let worker = {
            let core = Arc::clone(&core);
            let signal = Arc::clone(&signal);
            thread::spawn(move || decay_loop(core, signal, interval))
        };
        Self {
            core,
            signal,
            worker: Some(worker),
            interval,
        }
    }

    /// Returns the configured sweep interval.
    pub fn decay_interval(&self) -> Duration {
        self.interval
    }

    /// Runs one decay sweep on the caller's thread; returns the number of
    /// demoted entries.
    ///
    /// Maintenance hook; the worker does this on its own every interval.
    pub fn sweep_now(&self) -> usize {
        let mut core = self.core.write();
        core.decay_sweep(Instant::now(), self.interval)
    }
}

impl<K, V> AlfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Inserts or refreshes `key` (level +1 for existing keys); returns the
    /// evicted key, if any.
    pub fn insert(&self, key: K, value: V) -> Option<K> {
        let mut core = self.core.write();
        core.insert(key, value)
    }

    /// Returns a clone of the value; no frequency or recency change.
    pub fn get(&self, key: &K) -> Option<V> {
        let core = self.core.read();
        core.get(key).cloned()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut core = self.core.write();
        core.remove(key)
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        let core = self.core.read();
        core.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        let core = self.core.read();
        core.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        let core = self.core.read();
        core.capacity()
    }

    /// Returns `true` if `key` is tracked.
    pub fn contains(&self, key: &K) -> bool {
        let core = self.core.read();
        core.contains(key)
    }

    /// Returns the current frequency level of `key`.
    pub fn level_of(&self, key: &K) -> Option<u32> {
        let core = self.core.read();
        core.level_of(key)
    }

    /// Returns the next eviction candidate's key.
    pub fn last_key(&self) -> Option<K> {
        let core = self.core.read();
        core.back_key().cloned()
    }

    /// Drops all keys and tiers. The worker keeps running.
    pub fn clear(&self) {
        let mut core = self.core.write();
        core.clear()
    }

    /// Validates the manager and every tier.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let core = self.core.read();
        core.check_invariants()
    }
}

impl<K, V> Drop for AlfuCache<K, V> {
    fn drop(&mut self) {
        *self.signal.stop.lock() = true;
        self.signal.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl<K, V> ConcurrentCache<K, V> for AlfuCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Debug + Send + Sync + 'static,
{
    fn insert(&self, key: K, value: V) {
        AlfuCache::insert(self, key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        AlfuCache::get(self, key)
    }

    fn remove(&self, key: &K) {
        AlfuCache::remove(self, key);
    }

    fn len(&self) -> usize {
        AlfuCache::len(self)
    }

    fn last_key(&self) -> Option<K> {
        AlfuCache::last_key(self)
    }

    fn order_print(&self, _level: u32) {
        let core = self.core.read();
        core.order_print();
    }
}

/// Worker body: wait out the interval (or a stop signal), then sweep.
///
/// An inconsistency found mid-sweep is logged by the tier code and the loop
/// carries on with its next tick; nothing here terminates it silently.
fn decay_loop<K, V>(core: Arc<RwLock<LfuCore<K, V>>>, signal: Arc<WorkerSignal>, interval: Duration)
where
    K: Eq + Hash + Clone,
{
    tracing::debug!(interval_secs = interval.as_secs(), "decay worker started");
    loop {
        {
            let mut stopped = signal.stop.lock();
            if *stopped {
                break;
            }
            let timed_out = signal.wake.wait_for(&mut stopped, interval).timed_out();
            if *stopped {
                break;
            }
            if !timed_out {
                // Woken without a stop request; go back to waiting.
                continue;
            }
        }

        let mut guard = core.write();
        let demoted = guard.decay_sweep(Instant::now(), interval);
        #[cfg(debug_assertions)]
        if let Err(err) = guard.check_invariants() {
            tracing::error!(error = %err, "post-sweep consistency check failed");
        }
        drop(guard);
        tracing::debug!(demoted, "decay sweep finished");
    }
    tracing::debug!("decay worker stopped");
}
