//! tiercache: in-process key-value caching with swappable eviction engines.
//!
//! Three policies share one contract ([`traits::ConcurrentCache`]):
//!
//! - **LRU** ([`policy::lru`]): recency order over an intrusive chain.
//! - **LFU** ([`policy::lfu`]): frequency tiers, each an LRU store, with
//!   eviction from the tail of the minimum occupied tier.
//! - **ALFU** ([`policy::alfu`]): LFU plus a background sweep that halves the
//!   frequency level of tiers whose tail has gone stale.
//!
//! Promotion, whether recency or frequency, happens only on writes; `get`
//! never reorders anything. See [`traits`] for why.
//!
//! ```
//! use tiercache::builder::{CacheBuilder, CachePolicy};
//!
//! let cache = CacheBuilder::new(2).build::<&str, i32>(CachePolicy::Lru);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.insert("c", 3); // evicts "a"
//!
//! assert_eq!(cache.get(&"a"), None);
//! assert_eq!(cache.last_key(), Some("b"));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod traits;
