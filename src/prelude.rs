pub use crate::builder::{Cache, CacheBuilder, CachePolicy, DEFAULT_CAPACITY};
pub use crate::ds::{EntryArena, EntryId, RecencyStore};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::alfu::DEFAULT_DECAY_INTERVAL;
pub use crate::policy::{AlfuCache, LfuCache, LfuCore, LruCache};
pub use crate::traits::ConcurrentCache;
