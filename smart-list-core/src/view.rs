//! View-model for the list cards a user sees.
//!
//! Cards and rows are kept in step with the cache by the engine; nothing
//! here reads identity back out of rendered text.

use chrono::NaiveDate;

use crate::models::{
    parse_target_date, ItemKey, ItemRecord, ListMetadata, ListRecord, NameMatch,
};
use crate::sync::{SaveStatus, UserListRow};

/// One rendered item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub item_id: Option<i64>,
    pub name: String,
    pub qty: u32,
}

impl ViewRow {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.item_id, self.name.clone())
    }

    pub fn to_item(&self) -> ItemRecord {
        ItemRecord {
            id: self.item_id,
            name: self.name.clone(),
            qty: self.qty,
        }
    }
}

impl From<&ItemRecord> for ViewRow {
    fn from(item: &ItemRecord) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            qty: item.qty,
        }
    }
}

/// A list card: header metadata, item rows and the save button state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCard {
    pub list_id: String,
    pub name: String,
    pub target_date: Option<NaiveDate>,
    pub frequency: Option<String>,
    pub expanded: bool,
    pub rows: Vec<ViewRow>,
    pub save: SaveStatus,
}

impl ListCard {
    pub fn new(list_id: impl Into<String>, meta: &ListMetadata) -> Self {
        Self {
            list_id: list_id.into(),
            name: meta.name.clone(),
            target_date: meta.target_date,
            frequency: meta.frequency.clone(),
            expanded: false,
            rows: Vec::new(),
            save: SaveStatus::Clean,
        }
    }

    pub fn metadata(&self) -> ListMetadata {
        ListMetadata {
            name: self.name.clone(),
            target_date: self.target_date,
            frequency: self.frequency.clone(),
        }
    }

    pub fn position(&self, key: &ItemKey, names: NameMatch) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| key.matches_parts(row.item_id, &row.name, names))
    }

    pub fn find(&self, key: &ItemKey, names: NameMatch) -> Option<&ViewRow> {
        self.position(key, names).map(|i| &self.rows[i])
    }

    /// Replace all rows with the items of a cache record.
    pub fn render_items(&mut self, items: &[ItemRecord]) {
        self.rows = items
            .iter()
            .filter(|item| !item.name.trim().is_empty())
            .map(ViewRow::from)
            .collect();
    }

    /// The rows as cache items, in display order.
    pub fn to_record(&self) -> ListRecord {
        ListRecord::new(self.list_id.clone())
            .with_items(self.rows.iter().map(ViewRow::to_item).collect())
    }
}

/// Every list card on the page, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub cards: Vec<ListCard>,
    focus: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group server-rendered rows into cards.
    ///
    /// Rows arrive ordered by list; a row without an item contributes only
    /// the card itself. Zero-value target dates are dropped here.
    pub fn from_rows(rows: &[UserListRow]) -> Self {
        let mut view = ViewState::new();
        for row in rows {
            if row.list_id.trim().is_empty() {
                continue;
            }
            if view.card(&row.list_id).is_none() {
                let meta = ListMetadata {
                    name: if row.list_name.trim().is_empty() {
                        ListMetadata::placeholder(&row.list_id).name
                    } else {
                        row.list_name.trim().to_string()
                    },
                    target_date: row.target_date.as_deref().and_then(parse_target_date),
                    frequency: Some(row.list_freq.trim().to_string()).filter(|f| !f.is_empty()),
                };
                view.push_card(ListCard::new(row.list_id.clone(), &meta));
            }
            if row.has_item() {
                let item = row.to_item();
                if let Some(card) = view.card_mut(&row.list_id) {
                    if card.position(&item.key(), NameMatch::Exact).is_none() {
                        card.rows.push(ViewRow::from(&item));
                    }
                }
            }
        }
        view
    }

    pub fn card(&self, list_id: &str) -> Option<&ListCard> {
        self.cards.iter().find(|c| c.list_id == list_id)
    }

    pub fn card_mut(&mut self, list_id: &str) -> Option<&mut ListCard> {
        self.cards.iter_mut().find(|c| c.list_id == list_id)
    }

    pub fn contains(&self, list_id: &str) -> bool {
        self.card(list_id).is_some()
    }

    pub fn push_card(&mut self, card: ListCard) {
        if card.expanded {
            self.focus = Some(card.list_id.clone());
        }
        self.cards.push(card);
    }

    /// The most recently expanded card that is still open, falling back to
    /// the first open card.
    pub fn expanded(&self) -> Option<&ListCard> {
        self.focus
            .as_deref()
            .and_then(|id| self.card(id))
            .filter(|c| c.expanded)
            .or_else(|| self.cards.iter().find(|c| c.expanded))
    }

    /// Flip a card open or closed. Returns the new state.
    pub fn toggle(&mut self, list_id: &str) -> Option<bool> {
        let card = self.card_mut(list_id)?;
        card.expanded = !card.expanded;
        let expanded = card.expanded;
        if expanded {
            self.focus = Some(list_id.to_string());
        }
        Some(expanded)
    }

    /// Expand the first card if none is open. Returns the expanded card's id.
    pub fn ensure_expanded(&mut self) -> Option<String> {
        if let Some(card) = self.expanded() {
            return Some(card.list_id.clone());
        }
        let first = self.cards.first_mut()?;
        first.expanded = true;
        let id = first.list_id.clone();
        self.focus = Some(id.clone());
        Some(id)
    }
}
