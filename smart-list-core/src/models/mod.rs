mod item;
mod list;

pub use item::{parse_item_id, parse_qty, ItemKey, ItemRecord, NameMatch};
pub use list::{display_target_date, parse_target_date, ListMetadata, ListRecord};

pub(crate) use list::{blank_as_none, target_date_format};
