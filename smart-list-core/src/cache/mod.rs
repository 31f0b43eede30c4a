//! Local persistent cache for list contents and metadata.

mod list_cache;
mod store;

pub use list_cache::ListCache;
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
