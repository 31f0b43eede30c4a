//! Lists and their display metadata.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::item::{ItemKey, ItemRecord, NameMatch};

/// The cached contents of one list, keyed by the server-assigned list id.
///
/// Item order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub list_id: String,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl ListRecord {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<ItemRecord>) -> Self {
        self.items = items;
        self
    }

    pub fn position(&self, key: &ItemKey, names: NameMatch) -> Option<usize> {
        self.items.iter().position(|item| key.matches(item, names))
    }

    pub fn find(&self, key: &ItemKey, names: NameMatch) -> Option<&ItemRecord> {
        self.position(key, names).map(|i| &self.items[i])
    }

    /// Insert an item, or overwrite the quantity of the item it matches.
    pub fn upsert(&mut self, item: ItemRecord) {
        match self.position(&item.key(), NameMatch::Exact) {
            Some(i) => self.items[i].qty = item.qty,
            None => self.items.push(item),
        }
    }

    /// Set the quantity of a matching item. Returns false if nothing matched.
    pub fn set_qty(&mut self, key: &ItemKey, qty: u32) -> bool {
        match self.position(key, NameMatch::Exact) {
            Some(i) => {
                self.items[i].qty = qty;
                true
            }
            None => false,
        }
    }

    /// Remove every item matching `key`. Returns true if anything was removed.
    pub fn remove(&mut self, key: &ItemKey) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !key.matches(item, NameMatch::Exact));
        self.items.len() != before
    }
}

/// Display-only information about a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMetadata {
    pub name: String,
    #[serde(default, with = "target_date_format")]
    pub target_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub frequency: Option<String>,
}

impl ListMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_date: None,
            frequency: None,
        }
    }

    /// Name shown for lists whose metadata was never stored.
    pub fn placeholder(list_id: &str) -> Self {
        let short: String = list_id.chars().take(8).collect();
        Self::new(format!("List {}...", short))
    }
}

/// Parse a target date from any of the forms the backend emits.
///
/// Go's zero `time.Time` (`0001-01-01T00:00:00Z`, `0001-01-01 00:00:00 +0000 UTC`)
/// and anything unparseable yield `None`.
pub fn parse_target_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .or_else(|| {
            // "2025-06-01 00:00:00 +0000 UTC"
            raw.get(..19)
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
                .map(|dt| dt.date())
        })?;

    (date.year() > 1).then_some(date)
}

/// Render a target date for display, hiding the zero sentinel.
pub fn display_target_date(date: Option<NaiveDate>) -> Option<String> {
    date.filter(|d| d.year() > 1)
        .map(|d| d.format("%Y-%m-%d").to_string())
}

pub(crate) mod target_date_format {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match display_target_date(*date) {
            Some(text) => s.serialize_str(&text),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_target_date))
    }
}

pub(crate) fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
