//! Saving lists to the SmartList backend.
//!
//! A save sends a list's full cached item set as one batch replace and
//! takes the server's rows as the new truth. The per-list button state
//! lives in [`SaveStatus`].

mod driver;
mod remote;
mod status;

pub use driver::{create_list, save_list, NewListForm};
pub use remote::{
    normalize_items, CreatedList, HttpRemote, ListRemote, NewListRequest, TransportError,
    UserListRow,
};
pub use status::{IndicatorTimings, SaveStatus};
