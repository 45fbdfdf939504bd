pub mod arena;
pub mod recency_store;

pub use arena::{EntryArena, EntryId};
pub use recency_store::{RecencyIter, RecencyStore};
