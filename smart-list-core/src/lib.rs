//! SmartList Core Library
//!
//! Client-side list synchronization for SmartList: the local cache, the
//! list view-model, item edits and the explicit save to the backend.

pub mod cache;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod models;
pub mod session;
pub mod sync;
pub mod view;

pub use cache::{FileStore, KeyValueStore, ListCache, MemoryStore, StorageError};
pub use catalog::{Catalog, CatalogCategory, CatalogEntry, CatalogRow, CatalogView};
pub use engine::{
    AddOutcome, CreateMode, DuplicateChoice, DuplicateItem, EngineOptions, ListSyncEngine,
    SaveOutcome, SaveTicket,
};
pub use error::ListError;
pub use models::{ItemKey, ItemRecord, ListMetadata, ListRecord, NameMatch};
pub use session::{Command, CommandOutcome, UiSession};
pub use sync::{
    create_list, save_list, CreatedList, HttpRemote, IndicatorTimings, ListRemote, NewListForm,
    SaveStatus, TransportError, UserListRow,
};
pub use view::{ListCard, ViewRow, ViewState};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
