//! Capacity-bounded key-value store with strict promotion order.
//!
//! `RecencyStore` is the ordering primitive the whole crate is built on: a
//! hash index for O(1) lookup plus an intrusive doubly-linked chain over
//! [`EntryArena`] ids for O(1) promotion and eviction. Used directly it is an
//! LRU store; the tier manager in [`policy::lfu`](crate::policy::lfu) uses
//! one instance per frequency level.
//!
//! ## Architecture
//!
//! ```text
//!   index (FxHashMap<K, EntryId>)      entries (EntryArena<Node<K, V>>)
//!   ┌─────────┬─────────┐              ┌──────┬──────────────────────────────┐
//!   │   Key   │ EntryId │              │  Id  │ Node { prev, next, ts, k, v }│
//!   ├─────────┼─────────┤              ├──────┼──────────────────────────────┤
//!   │  "a"    │  id_0   │─────────────►│ id_0 │ prev: None,    next: id_1    │
//!   │  "b"    │  id_1   │─────────────►│ id_1 │ prev: id_0,    next: id_2    │
//!   │  "c"    │  id_2   │─────────────►│ id_2 │ prev: id_1,    next: None    │
//!   └─────────┴─────────┘              └──────┴──────────────────────────────┘
//!
//!   head ──► [id_0] ◄──► [id_1] ◄──► [id_2] ◄── tail
//!       most recently promoted     least recently promoted (evict first)
//! ```
//!
//! `head` and `tail` are nullable arena ids, so the empty, one-entry, and
//! two-entry states need no sentinel nodes and no special-cased relinking.
//!
//! ## Promotion happens on writes, not reads
//!
//! [`get`](RecencyStore::get) does **not** move an entry; only
//! [`insert`](RecencyStore::insert) (and the explicit
//! [`touch`](RecencyStore::touch)) promote to the head. Callers expecting
//! textbook read-through LRU ordering will be surprised: the eviction
//! candidate is the least recently *written* key, and reading it does not
//! rescue it.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::arena::{EntryArena, EntryId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<K, V> {
    // Link fields first; they are touched on every promotion and eviction.
    prev: Option<EntryId>,
    next: Option<EntryId>,
    last_update: Instant,
    key: K,
    value: V,
}

/// Capacity-bounded map with an intrusive recency chain.
///
/// Single-threaded core; the policy layer provides locking. All operations
/// are O(1) except [`iter`](Self::iter), [`clear`](Self::clear), and a
/// [`resize`](Self::resize) that shrinks.
#[derive(Debug)]
pub struct RecencyStore<K, V> {
    entries: EntryArena<Node<K, V>>,
    index: FxHashMap<K, EntryId>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    capacity: usize,
}

impl<K, V> RecencyStore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty store bounded to `capacity` entries.
    ///
    /// A capacity of 0 creates a store that retains nothing: every insert is
    /// immediately evicted.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: EntryArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or refreshes `key`, promoting it to the head.
    ///
    /// A present key keeps its node: the value and timestamp are updated in
    /// place and the node moves to the head (no relinking if it already is
    /// the head). An absent key gets a fresh node at the head; if that pushes
    /// the count past capacity, the tail entry is evicted and its key
    /// returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(&id) = self.index.get(&key) {
            if let Some(node) = self.entries.get_mut(id) {
                node.value = value;
                node.last_update = Instant::now();
            }
            self.move_to_front(id);
            return None;
        }

        let id = self.entries.insert(Node {
            prev: None,
            next: None,
            last_update: Instant::now(),
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        self.attach_front(id);

        if self.entries.len() > self.capacity {
            return self.pop_back().map(|(key, _)| key);
        }
        None
    }

    /// Returns the value for `key` without promoting it.
    ///
    /// Recency is updated only by [`insert`](Self::insert) and
    /// [`touch`](Self::touch); a read leaves the chain untouched.
    pub fn get(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|node| &node.value)
    }

    /// Promotes `key` to the head without changing its value.
    ///
    /// Returns `false` if the key is absent.
    pub fn touch(&mut self, key: &K) -> bool {
        let id = match self.index.get(key) {
            Some(&id) => id,
            None => return false,
        };
        if let Some(node) = self.entries.get_mut(id) {
            node.last_update = Instant::now();
        }
        self.move_to_front(id);
        true
    }

    /// Removes `key`, returning its value.
    ///
    /// Head, tail, and interior nodes all go through the same detach path;
    /// removing the last entry restores `head == tail == None`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.detach(id);
        self.entries.remove(id).map(|node| node.value)
    }

    /// Detaches and returns the tail entry (the eviction candidate).
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let id = self.tail?;
        self.detach(id);
        let node = self.entries.remove(id)?;
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Returns the head key (most recently promoted).
    pub fn front_key(&self) -> Option<&K> {
        self.head
            .and_then(|id| self.entries.get(id).map(|node| &node.key))
    }

    /// Returns the tail key (least recently promoted, next to be evicted).
    pub fn back_key(&self) -> Option<&K> {
        self.tail
            .and_then(|id| self.entries.get(id).map(|node| &node.key))
    }

    /// Returns the tail entry's key, value, and last-update time.
    ///
    /// The decay sweep inspects exactly this: the stalest candidate of a
    /// frequency tier is its tail.
    pub fn back_entry(&self) -> Option<(&K, &V, Instant)> {
        let id = self.tail?;
        self.entries
            .get(id)
            .map(|node| (&node.key, &node.value, node.last_update))
    }

    /// Returns the key following `key` toward the tail.
    pub fn next_key(&self, key: &K) -> Option<&K> {
        let id = *self.index.get(key)?;
        let next = self.entries.get(id)?.next?;
        self.entries.get(next).map(|node| &node.key)
    }

    /// Returns the key preceding `key` toward the head.
    pub fn prev_key(&self, key: &K) -> Option<&K> {
        let id = *self.index.get(key)?;
        let prev = self.entries.get(id)?.prev?;
        self.entries.get(prev).map(|node| &node.key)
    }

    /// Changes the capacity, evicting from the tail while over the new bound.
    ///
    /// Raising the capacity evicts nothing.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            self.pop_back();
        }
    }

    /// Drops all entries and resets the chain.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates entries from head (most recent) to tail.
    pub fn iter(&self) -> RecencyIter<'_, K, V> {
        RecencyIter {
            store: self,
            current: self.head,
        }
    }

    /// Validates the full chain/index structure.
    ///
    /// O(n); intended for tests and the background sweep's consistency
    /// surfacing, not for hot paths.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() || !self.is_empty() {
                return Err(InvariantError::new(
                    "empty chain with live head, tail, or entries",
                ));
            }
            return Ok(());
        }

        if self.entries.len() != self.index.len() {
            return Err(InvariantError::new(format!(
                "arena holds {} entries but index holds {}",
                self.entries.len(),
                self.index.len()
            )));
        }

        let mut prev = None;
        let mut current = self.head;
        let mut count = 0usize;
        while let Some(id) = current {
            let node = self
                .entries
                .get(id)
                .ok_or_else(|| InvariantError::new("chain references a dead arena slot"))?;
            if node.prev != prev {
                return Err(InvariantError::new("asymmetric prev link in chain"));
            }
            if self.index.get(&node.key) != Some(&id) {
                return Err(InvariantError::new("index does not map key to its node"));
            }
            count += 1;
            if count > self.entries.len() {
                return Err(InvariantError::new("chain is cyclic"));
            }
            prev = Some(id);
            current = node.next;
        }

        if self.tail != prev {
            return Err(InvariantError::new("tail does not terminate the chain"));
        }
        if count != self.entries.len() {
            return Err(InvariantError::new(format!(
                "chain reaches {} entries, arena holds {}",
                count,
                self.entries.len()
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("recency store invariant violated: {err}");
        }
    }

    fn detach(&mut self, id: EntryId) {
        let (prev, next) = match self.entries.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.entries.get_mut(prev_id) {
                    prev_node.next = next;
                }
            },
            None => self.head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(next_node) = self.entries.get_mut(next_id) {
                    next_node.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(node) = self.entries.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, id: EntryId) {
        let old_head = self.head;
        if let Some(node) = self.entries.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old_id) => {
                if let Some(old_node) = self.entries.get_mut(old_id) {
                    old_node.prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn move_to_front(&mut self, id: EntryId) {
        if Some(id) == self.head {
            return;
        }
        self.detach(id);
        self.attach_front(id);
    }
}

/// Iterator over `(key, value, last_update)` from head to tail.
pub struct RecencyIter<'a, K, V> {
    store: &'a RecencyStore<K, V>,
    current: Option<EntryId>,
}

impl<'a, K, V> Iterator for RecencyIter<'a, K, V> {
    type Item = (&'a K, &'a V, Instant);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.store.entries.get(id)?;
        self.current = node.next;
        Some((&node.key, &node.value, node.last_update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Eq + Hash + Clone, V>(store: &RecencyStore<K, V>) -> Vec<K> {
        store.iter().map(|(k, _, _)| k.clone()).collect()
    }

    mod ordering {
        use super::*;

        #[test]
        fn insert_places_new_keys_at_head() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.insert("c", 3);

            assert_eq!(keys(&store), vec!["c", "b", "a"]);
            assert_eq!(store.front_key(), Some(&"c"));
            assert_eq!(store.back_key(), Some(&"a"));
            store.debug_validate_invariants();
        }

        #[test]
        fn reinsert_promotes_and_updates_value() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.insert("c", 3);

            store.insert("a", 11);
            assert_eq!(keys(&store), vec!["a", "c", "b"]);
            assert_eq!(store.get(&"a"), Some(&11));
            assert_eq!(store.len(), 3);
            store.debug_validate_invariants();
        }

        #[test]
        fn reinsert_of_head_does_not_relink() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);

            store.insert("b", 22);
            assert_eq!(keys(&store), vec!["b", "a"]);
            assert_eq!(store.get(&"b"), Some(&22));
            store.debug_validate_invariants();
        }

        #[test]
        fn get_does_not_promote() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.insert("c", 3);

            for _ in 0..5 {
                assert_eq!(store.get(&"a"), Some(&1));
            }
            assert_eq!(store.back_key(), Some(&"a"));
            assert_eq!(keys(&store), vec!["c", "b", "a"]);
        }

        #[test]
        fn touch_promotes_without_value_change() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);

            assert!(store.touch(&"a"));
            assert_eq!(keys(&store), vec!["a", "b"]);
            assert_eq!(store.get(&"a"), Some(&1));
            assert!(!store.touch(&"missing"));
        }

        #[test]
        fn two_entry_promotion_swaps_ends() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);

            store.insert("a", 10);
            assert_eq!(store.front_key(), Some(&"a"));
            assert_eq!(store.back_key(), Some(&"b"));
            assert_eq!(store.next_key(&"a"), Some(&"b"));
            assert_eq!(store.prev_key(&"b"), Some(&"a"));
            store.debug_validate_invariants();
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn overflow_evicts_tail_and_returns_key() {
            let mut store = RecencyStore::new(2);
            assert_eq!(store.insert("a", 1), None);
            assert_eq!(store.insert("b", 2), None);
            assert_eq!(store.insert("c", 3), Some("a"));

            assert_eq!(store.len(), 2);
            assert!(!store.contains(&"a"));
            assert_eq!(keys(&store), vec!["c", "b"]);
            store.debug_validate_invariants();
        }

        #[test]
        fn capacity_zero_retains_nothing() {
            let mut store = RecencyStore::new(0);
            assert_eq!(store.insert("a", 1), Some("a"));
            assert!(store.is_empty());
            assert_eq!(store.front_key(), None);
            assert_eq!(store.back_key(), None);
        }

        #[test]
        fn pop_back_drains_in_reverse_insert_order() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.insert("c", 3);

            assert_eq!(store.pop_back(), Some(("a", 1)));
            assert_eq!(store.pop_back(), Some(("b", 2)));
            assert_eq!(store.pop_back(), Some(("c", 3)));
            assert_eq!(store.pop_back(), None);
            assert!(store.is_empty());
            store.debug_validate_invariants();
        }

        #[test]
        fn resize_down_evicts_from_tail() {
            let mut store = RecencyStore::new(5);
            for (i, key) in ["a", "b", "c", "d", "e"].iter().enumerate() {
                store.insert(*key, i);
            }

            store.resize(2);
            assert_eq!(store.len(), 2);
            assert_eq!(keys(&store), vec!["e", "d"]);

            store.resize(10);
            assert_eq!(store.len(), 2);
            assert_eq!(store.capacity(), 10);
            store.debug_validate_invariants();
        }
    }

    mod removal {
        use super::*;

        #[test]
        fn remove_head_tail_and_interior() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.insert("c", 3);
            store.insert("d", 4);

            assert_eq!(store.remove(&"d"), Some(4)); // head
            assert_eq!(store.remove(&"a"), Some(1)); // tail
            assert_eq!(store.remove(&"b"), Some(2)); // interior of what remains
            assert_eq!(keys(&store), vec!["c"]);
            store.debug_validate_invariants();

            assert_eq!(store.remove(&"c"), Some(3));
            assert!(store.is_empty());
            assert_eq!(store.front_key(), None);
            assert_eq!(store.back_key(), None);
            store.debug_validate_invariants();
        }

        #[test]
        fn remove_missing_is_noop() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            assert_eq!(store.remove(&"zzz"), None);
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn clear_resets_chain() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.clear();

            assert!(store.is_empty());
            assert_eq!(store.front_key(), None);
            assert_eq!(store.pop_back(), None);
            store.debug_validate_invariants();
        }
    }

    mod traversal {
        use super::*;

        #[test]
        fn next_and_prev_walk_the_chain() {
            let mut store = RecencyStore::new(10);
            store.insert("a", 1);
            store.insert("b", 2);
            store.insert("c", 3);
            // chain: c -> b -> a

            assert_eq!(store.next_key(&"c"), Some(&"b"));
            assert_eq!(store.next_key(&"b"), Some(&"a"));
            assert_eq!(store.next_key(&"a"), None);
            assert_eq!(store.prev_key(&"a"), Some(&"b"));
            assert_eq!(store.prev_key(&"c"), None);
            assert_eq!(store.next_key(&"missing"), None);
        }

        #[test]
        fn back_entry_exposes_tail_metadata() {
            let mut store = RecencyStore::new(10);
            assert!(store.back_entry().is_none());
            store.insert("a", 1);
            store.insert("b", 2);

            let (key, value, ts) = store.back_entry().unwrap();
            assert_eq!(*key, "a");
            assert_eq!(*value, 1);
            assert!(ts.elapsed().as_secs() < 60);
        }
    }

    mod invariants {
        use super::*;

        #[test]
        fn check_invariants_holds_through_mixed_ops() {
            let mut store = RecencyStore::new(4);
            for round in 0..50u32 {
                store.insert(round % 7, round);
                if round % 3 == 0 {
                    store.remove(&(round % 5));
                }
                if round % 11 == 0 {
                    store.pop_back();
                }
                assert!(store.check_invariants().is_ok());
                assert!(store.len() <= store.capacity());
            }
        }
    }
}
