pub mod alfu;
pub mod lfu;
pub mod lru;

pub use alfu::AlfuCache;
pub use lfu::{LfuCache, LfuCore};
pub use lru::LruCache;
