//! Grocery items and the identity rule used to match them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How item names are compared when looking for an existing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    /// Byte-for-byte comparison.
    Exact,
    /// Case-insensitive comparison ("Milk" == "milk").
    #[default]
    IgnoreCase,
}

impl NameMatch {
    pub fn same(self, a: &str, b: &str) -> bool {
        match self {
            NameMatch::Exact => a == b,
            NameMatch::IgnoreCase => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

impl fmt::Display for NameMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatch::Exact => write!(f, "exact"),
            NameMatch::IgnoreCase => write!(f, "ignore_case"),
        }
    }
}

/// A single entry in a list as stored in the local cache.
///
/// `id` is assigned by the server once the item has been saved; items created
/// locally carry `None` until the next successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Option<i64>,
    pub name: String,
    pub qty: u32,
}

impl ItemRecord {
    /// Create an unsaved item with quantity 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            qty: 1,
        }
    }

    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty.max(1);
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for ItemRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} x{} (#{})", self.name, self.qty, id),
            None => write!(f, "{} x{} (unsaved)", self.name, self.qty),
        }
    }
}

/// Reference to an item coming from the UI: an optional server id plus the
/// displayed name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemKey {
    pub id: Option<i64>,
    pub name: String,
}

impl ItemKey {
    pub fn new(id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(None, name)
    }

    /// Match by id when both sides carry one, otherwise by name.
    pub fn matches(&self, item: &ItemRecord, names: NameMatch) -> bool {
        self.matches_parts(item.id, &item.name, names)
    }

    pub(crate) fn matches_parts(&self, id: Option<i64>, name: &str, names: NameMatch) -> bool {
        match (self.id, id) {
            (Some(a), Some(b)) => a == b,
            _ => names.same(&self.name, name),
        }
    }
}

/// Parse a raw item id the way the page attributes carried them: blank,
/// `"null"` or non-numeric values mean "no id".
pub fn parse_item_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" || raw == "undefined" {
        return None;
    }
    leading_integer(raw)
}

/// Parse a quantity input. Anything that does not start with a positive
/// integer becomes 1.
pub fn parse_qty(raw: &str) -> u32 {
    match leading_integer(raw.trim()) {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 1,
    }
}

// Integer prefix, e.g. "12abc" -> 12, "-3" -> -3, "abc" -> None.
fn leading_integer(s: &str) -> Option<i64> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}
