//! The list synchronization engine.
//!
//! Owns the local cache and the view-model and keeps them aligned: every
//! item mutation touches both, and a save replaces the cached items with
//! the server's answer.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::{KeyValueStore, ListCache};
use crate::error::ListError;
use crate::models::{parse_qty, ItemKey, ItemRecord, ListMetadata, ListRecord, NameMatch};
use crate::sync::{
    normalize_items, CreatedList, IndicatorTimings, SaveStatus, TransportError, UserListRow,
};
use crate::view::{ListCard, ViewRow, ViewState};

/// Tunables for the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// How `add_item` detects an existing item by name.
    pub name_match: NameMatch,
    pub timings: IndicatorTimings,
}

/// An add that collided with an item already on the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateItem {
    pub list_id: String,
    /// Identity of the row already present.
    pub existing: ItemKey,
    /// Its current quantity.
    pub qty: u32,
    /// The name the user typed.
    pub requested: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateChoice {
    /// Bump the existing item's quantity by one.
    Increment,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Nothing changed yet; answer with [`ListSyncEngine::resolve_duplicate`].
    Duplicate(DuplicateItem),
    Incremented { qty: u32 },
    Aborted,
}

/// How a newly created list reaches the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateMode {
    /// Append an expanded card for the new list.
    #[default]
    InPlace,
    /// Rebuild every card from the cache.
    Reload,
}

/// A save in progress: the snapshot to send and the list it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub list_id: String,
    pub payload: ListRecord,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Saved { items: usize, pending: bool },
    Failed(TransportError),
}

// Local edits made while a save is in flight, replayed over the response.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mutation {
    Upsert(ItemRecord),
    SetQty(ItemKey, u32),
    Remove(ItemKey),
}

impl Mutation {
    fn apply(&self, record: &mut ListRecord) {
        match self {
            Mutation::Upsert(item) => record.upsert(item.clone()),
            Mutation::SetQty(key, qty) => {
                if !record.set_qty(key, *qty) {
                    record.upsert(ItemRecord {
                        id: key.id,
                        name: key.name.clone(),
                        qty: *qty,
                    });
                }
            }
            Mutation::Remove(key) => {
                record.remove(key);
            }
        }
    }
}

pub struct ListSyncEngine<S> {
    cache: ListCache<S>,
    view: ViewState,
    options: EngineOptions,
    in_flight: HashMap<String, Vec<Mutation>>,
}

impl<S: KeyValueStore> ListSyncEngine<S> {
    /// Start the engine over an initial view and reconcile it with the cache.
    ///
    /// Runs in this order, once per engine:
    /// 1. lists that exist only in the cache get a card,
    /// 2. the first card is expanded if none is,
    /// 3. the cache is seeded from rendered rows that carry a server id,
    /// 4. cached items missing from a card are appended to it.
    pub fn bootstrap(
        cache: ListCache<S>,
        initial: ViewState,
        options: EngineOptions,
    ) -> Result<Self, ListError> {
        let mut engine = Self {
            cache,
            view: initial,
            options,
            in_flight: HashMap::new(),
        };

        let rendered: Vec<String> = engine
            .view
            .cards
            .iter()
            .map(|c| c.list_id.clone())
            .collect();

        engine.restore_cached_lists()?;
        engine.view.ensure_expanded();

        for list_id in &rendered {
            engine.seed_from_view(list_id)?;
        }
        for list_id in &rendered {
            engine.merge_cached_items(list_id)?;
        }
        for card in engine.view.cards.iter_mut() {
            if engine.cache.is_dirty(&card.list_id)? {
                card.save = SaveStatus::Dirty;
            }
        }

        Ok(engine)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn cache(&self) -> &ListCache<S> {
        &self.cache
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn card(&self, list_id: &str) -> Result<&ListCard, ListError> {
        self.view.card(list_id).ok_or_else(|| not_found(list_id))
    }

    pub fn is_saving(&self, list_id: &str) -> bool {
        self.in_flight.contains_key(list_id)
    }

    /// Expand or collapse a card. Returns whether it is now expanded.
    pub fn toggle_list(&mut self, list_id: &str) -> Result<bool, ListError> {
        self.view.toggle(list_id).ok_or_else(|| not_found(list_id))
    }

    /// Expand the first card unless one is open already.
    pub fn ensure_expanded(&mut self) -> Option<String> {
        self.view.ensure_expanded()
    }

    /// Add an item to a list.
    ///
    /// An item matching by id, or by name under the configured
    /// [`NameMatch`], is reported as a duplicate and left alone.
    pub fn add_item(
        &mut self,
        list_id: &str,
        name: &str,
        qty: u32,
        item_id: Option<i64>,
    ) -> Result<AddOutcome, ListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::validation("Item name cannot be empty"));
        }

        let card = find_card(&mut self.view, list_id)?;
        let key = ItemKey::new(item_id, name);
        if let Some(row) = card.find(&key, self.options.name_match) {
            return Ok(AddOutcome::Duplicate(DuplicateItem {
                list_id: list_id.to_string(),
                existing: row.key(),
                qty: row.qty,
                requested: name.to_string(),
            }));
        }

        let item = ItemRecord {
            id: item_id,
            name: name.to_string(),
            qty: qty.max(1),
        };
        card.rows.push(ViewRow::from(&item));

        let mut record = self.cached_or_empty(list_id)?;
        record.upsert(item.clone());
        self.cache.put(list_id, &record)?;

        self.record(list_id, Mutation::Upsert(item));
        self.touch(list_id)?;
        Ok(AddOutcome::Added)
    }

    /// Answer a duplicate reported by [`add_item`](Self::add_item).
    pub fn resolve_duplicate(
        &mut self,
        duplicate: &DuplicateItem,
        choice: DuplicateChoice,
    ) -> Result<AddOutcome, ListError> {
        match choice {
            DuplicateChoice::Abort => Ok(AddOutcome::Aborted),
            DuplicateChoice::Increment => {
                let card = self.card(&duplicate.list_id)?;
                let current = card
                    .find(&duplicate.existing, NameMatch::Exact)
                    .map(|row| row.qty)
                    .ok_or_else(|| item_not_found(&duplicate.list_id, &duplicate.existing))?;

                let qty = self.set_qty(
                    &duplicate.list_id,
                    &duplicate.existing,
                    current.saturating_add(1),
                )?;
                Ok(AddOutcome::Incremented { qty })
            }
        }
    }

    /// Set an item's quantity from raw user input. Unparseable or
    /// non-positive input becomes 1.
    pub fn update_qty(
        &mut self,
        list_id: &str,
        key: &ItemKey,
        raw: &str,
    ) -> Result<u32, ListError> {
        self.set_qty(list_id, key, parse_qty(raw))
    }

    pub fn set_qty(&mut self, list_id: &str, key: &ItemKey, qty: u32) -> Result<u32, ListError> {
        let qty = qty.max(1);
        let card = find_card(&mut self.view, list_id)?;
        let Some(index) = card.position(key, NameMatch::Exact) else {
            let err = item_not_found(list_id, key);
            tracing::warn!("{}", err);
            return Err(err);
        };
        card.rows[index].qty = qty;
        let row = card.rows[index].to_item();

        let mut record = self.cached_or_empty(list_id)?;
        if !record.set_qty(key, qty) {
            record.upsert(row);
        }
        self.cache.put(list_id, &record)?;

        self.record(list_id, Mutation::SetQty(key.clone(), qty));
        self.touch(list_id)?;
        Ok(qty)
    }

    /// Remove an item from the view and the cache.
    ///
    /// Returns false, changing nothing, when no item matches.
    pub fn remove_item(&mut self, list_id: &str, key: &ItemKey) -> Result<bool, ListError> {
        let card = find_card(&mut self.view, list_id)?;
        let before = card.rows.len();
        card.rows
            .retain(|row| !key.matches_parts(row.item_id, &row.name, NameMatch::Exact));
        let mut removed = card.rows.len() != before;

        if let Some(mut record) = self.cache.get(list_id)? {
            if record.remove(key) {
                self.cache.put(list_id, &record)?;
                removed = true;
            }
        }

        if removed {
            self.record(list_id, Mutation::Remove(key.clone()));
            self.touch(list_id)?;
        }
        Ok(removed)
    }

    /// Flag a list as having unsaved changes. No-op while it is saving.
    pub fn mark_dirty(&mut self, list_id: &str) -> Result<(), ListError> {
        let card = find_card(&mut self.view, list_id)?;
        if card.save.is_saving() {
            return Ok(());
        }
        card.save.mark_dirty();
        self.cache.set_dirty(list_id, true)?;
        Ok(())
    }

    /// Snapshot a list for saving and enter `Saving`.
    ///
    /// Returns `None` when a save for the list is already in flight.
    pub fn begin_save(&mut self, list_id: &str) -> Result<Option<SaveTicket>, ListError> {
        let card = find_card(&mut self.view, list_id)?;
        if card.save.is_saving() || self.in_flight.contains_key(list_id) {
            tracing::debug!("Save already in progress for list {}", list_id);
            return Ok(None);
        }

        let payload = self
            .cache
            .get(list_id)?
            .unwrap_or_else(|| ListRecord::new(list_id));

        card.save = SaveStatus::Saving;
        self.in_flight.insert(list_id.to_string(), Vec::new());
        tracing::debug!("Saving list {} with {} item(s)", list_id, payload.items.len());

        Ok(Some(SaveTicket {
            list_id: list_id.to_string(),
            payload,
        }))
    }

    /// Apply the result of a save started with [`begin_save`](Self::begin_save).
    ///
    /// On success the cache becomes the server's rows plus any edits made
    /// while the request was out. On failure cache and rows stay as they are.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<Vec<UserListRow>, TransportError>,
        now: Instant,
    ) -> Result<SaveOutcome, ListError> {
        let list_id = ticket.list_id;
        let journal = self.in_flight.remove(&list_id).unwrap_or_default();

        let rows = match result {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!("Failed to save list {}: {}", list_id, err);
                if let Some(card) = self.view.card_mut(&list_id) {
                    card.save = SaveStatus::Failed { at: now };
                }
                self.cache.set_dirty(&list_id, true)?;
                return Ok(SaveOutcome::Failed(err));
            }
        };

        let mut record = ListRecord::new(list_id.clone()).with_items(normalize_items(&rows));
        for mutation in &journal {
            mutation.apply(&mut record);
        }
        let pending = !journal.is_empty();

        let stored = self
            .cache
            .put(&list_id, &record)
            .and_then(|_| self.cache.set_dirty(&list_id, pending));

        if let Some(card) = self.view.card_mut(&list_id) {
            card.save = match &stored {
                Ok(()) => {
                    card.render_items(&record.items);
                    SaveStatus::Saved { at: now, pending }
                }
                Err(_) => SaveStatus::Failed { at: now },
            };
        }
        stored?;

        tracing::debug!(
            "Saved list {}: {} item(s), {} edit(s) replayed",
            list_id,
            record.items.len(),
            journal.len()
        );
        Ok(SaveOutcome::Saved {
            items: record.items.len(),
            pending,
        })
    }

    /// Record a list the server just created.
    pub fn insert_created_list(
        &mut self,
        created: &CreatedList,
        mode: CreateMode,
    ) -> Result<(), ListError> {
        let meta = ListMetadata {
            name: if created.name.trim().is_empty() {
                ListMetadata::placeholder(&created.id).name
            } else {
                created.name.clone()
            },
            target_date: created.target_date,
            frequency: created.frequency.clone(),
        };

        self.cache.put(&created.id, &ListRecord::new(created.id.clone()))?;
        self.cache.put_meta(&created.id, &meta)?;

        match mode {
            CreateMode::InPlace => {
                if self.view.contains(&created.id) {
                    tracing::warn!("List {} is already shown", created.id);
                    return Ok(());
                }
                let mut card = ListCard::new(created.id.clone(), &meta);
                card.expanded = true;
                self.view.push_card(card);
                Ok(())
            }
            CreateMode::Reload => self.reload_view(),
        }
    }

    /// Rebuild every card from the cache, keeping the current card order and
    /// appending lists only the cache knows about.
    pub fn reload_view(&mut self) -> Result<(), ListError> {
        let mut ids: Vec<String> = self.view.cards.iter().map(|c| c.list_id.clone()).collect();
        for id in self.cache.list_ids()? {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut view = ViewState::new();
        for id in ids {
            let previous = self.view.card(&id);
            let meta = match self.cache.get_meta(&id)? {
                Some(meta) => meta,
                None => previous
                    .map(ListCard::metadata)
                    .unwrap_or_else(|| ListMetadata::placeholder(&id)),
            };

            let mut card = ListCard::new(id.clone(), &meta);
            match self.cache.get(&id)? {
                Some(record) => card.render_items(&record.items),
                None => card.rows = previous.map(|c| c.rows.clone()).unwrap_or_default(),
            }
            card.save = if self.in_flight.contains_key(&id) {
                SaveStatus::Saving
            } else if self.cache.is_dirty(&id)? {
                SaveStatus::Dirty
            } else {
                SaveStatus::Clean
            };
            view.push_card(card);
        }

        view.ensure_expanded();
        self.view = view;
        Ok(())
    }

    /// Expire "Saved" and "Save Failed" indicators.
    pub fn tick(&mut self, now: Instant) {
        let timings = self.options.timings;
        for card in self.view.cards.iter_mut() {
            card.save = card.save.settle(now, &timings);
        }
    }

    fn restore_cached_lists(&mut self) -> Result<(), ListError> {
        for list_id in self.cache.list_ids()? {
            if self.view.contains(&list_id) {
                continue;
            }
            let Some(record) = self.cache.get(&list_id)? else {
                continue;
            };
            let meta = self
                .cache
                .get_meta(&list_id)?
                .unwrap_or_else(|| ListMetadata::placeholder(&list_id));

            let mut card = ListCard::new(list_id.clone(), &meta);
            card.render_items(&record.items);
            self.view.push_card(card);
        }
        Ok(())
    }

    fn seed_from_view(&mut self, list_id: &str) -> Result<(), ListError> {
        let Some(card) = self.view.card(list_id) else {
            return Ok(());
        };
        self.cache.put_meta(list_id, &card.metadata())?;

        let saved: Vec<ItemRecord> = card
            .rows
            .iter()
            .filter(|row| row.item_id.is_some())
            .filter(|row| {
                if row.name.trim().is_empty() {
                    tracing::warn!("Skipping rendered item with empty name in list {}", list_id);
                    false
                } else {
                    true
                }
            })
            .map(ViewRow::to_item)
            .collect();
        if saved.is_empty() {
            return Ok(());
        }

        let mut record = self.cached_or_empty(list_id)?;
        for item in saved {
            let known = record
                .items
                .iter()
                .any(|cached| cached.id == item.id || cached.name == item.name);
            if !known {
                record.items.push(item);
            }
        }
        self.cache.put(list_id, &record)?;
        Ok(())
    }

    fn merge_cached_items(&mut self, list_id: &str) -> Result<(), ListError> {
        let Some(record) = self.cache.get(list_id)? else {
            return Ok(());
        };
        let Some(card) = self.view.card_mut(list_id) else {
            return Ok(());
        };

        let mut merged = false;
        for item in &record.items {
            if item.name.trim().is_empty() {
                tracing::warn!("Skipping cached item with empty name in list {}", list_id);
                continue;
            }
            if card.rows.iter().any(|row| row.name == item.name) {
                continue;
            }
            card.rows.push(ViewRow::from(item));
            merged = true;
        }

        if merged {
            card.save.mark_dirty();
            self.cache.set_dirty(list_id, true)?;
        }
        Ok(())
    }

    fn cached_or_empty(&self, list_id: &str) -> Result<ListRecord, ListError> {
        Ok(self
            .cache
            .get(list_id)?
            .unwrap_or_else(|| ListRecord::new(list_id)))
    }

    fn record(&mut self, list_id: &str, mutation: Mutation) {
        if let Some(journal) = self.in_flight.get_mut(list_id) {
            journal.push(mutation);
        }
    }

    // Mark dirty after an item edit; the marker is persisted even mid-save.
    fn touch(&mut self, list_id: &str) -> Result<(), ListError> {
        if let Some(card) = self.view.card_mut(list_id) {
            card.save.mark_dirty();
        }
        self.cache.set_dirty(list_id, true)?;
        Ok(())
    }
}

fn find_card<'a>(view: &'a mut ViewState, list_id: &str) -> Result<&'a mut ListCard, ListError> {
    view.card_mut(list_id).ok_or_else(|| not_found(list_id))
}

fn not_found(list_id: &str) -> ListError {
    tracing::warn!("List card not found for id {}", list_id);
    ListError::ListNotFound(list_id.to_string())
}

fn item_not_found(list_id: &str, key: &ItemKey) -> ListError {
    ListError::ItemNotFound {
        list_id: list_id.to_string(),
        name: key.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    fn rows(value: serde_json::Value) -> Vec<UserListRow> {
        serde_json::from_value(value).unwrap()
    }

    fn empty_list_view() -> ViewState {
        ViewState::from_rows(&rows(json!([
            {"ItemID": 0, "ListID": "L1", "Name": "", "ListName": "Weekly"}
        ])))
    }

    fn engine(view: ViewState) -> ListSyncEngine<MemoryStore> {
        ListSyncEngine::bootstrap(
            ListCache::new(MemoryStore::new()),
            view,
            EngineOptions::default(),
        )
        .unwrap()
    }

    fn cached(engine: &ListSyncEngine<MemoryStore>, list_id: &str) -> Vec<ItemRecord> {
        engine
            .cache()
            .get(list_id)
            .unwrap()
            .map(|r| r.items)
            .unwrap_or_default()
    }

    fn shown(engine: &ListSyncEngine<MemoryStore>, list_id: &str) -> Vec<ItemRecord> {
        engine.card(list_id).unwrap().to_record().items
    }

    #[test]
    fn test_add_item_to_empty_list() {
        let mut engine = engine(empty_list_view());

        let outcome = engine.add_item("L1", "Milk", 1, None).unwrap();

        assert_eq!(outcome, AddOutcome::Added);
        let record = engine.cache().get("L1").unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"list_id": "L1", "items": [{"id": null, "name": "Milk", "qty": 1}]})
        );
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Dirty);
        assert!(engine.cache().is_dirty("L1").unwrap());
    }

    #[test]
    fn test_add_item_rejects_blank_name() {
        let mut engine = engine(empty_list_view());

        let err = engine.add_item("L1", "   ", 1, None).unwrap_err();

        assert!(matches!(err, ListError::Validation(_)));
        assert!(engine.cache().get("L1").unwrap().is_none());
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Clean);
    }

    #[test]
    fn test_add_item_unknown_list() {
        let mut engine = engine(empty_list_view());
        let err = engine.add_item("nope", "Milk", 1, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_ignores_case_then_increments() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();

        let AddOutcome::Duplicate(dup) = engine.add_item("L1", "milk", 1, None).unwrap() else {
            panic!("expected duplicate");
        };
        assert_eq!(dup.existing.name, "Milk");
        assert_eq!(shown(&engine, "L1").len(), 1);

        let outcome = engine.resolve_duplicate(&dup, DuplicateChoice::Increment).unwrap();
        assert_eq!(outcome, AddOutcome::Incremented { qty: 2 });
        assert_eq!(cached(&engine, "L1"), vec![ItemRecord::new("Milk").with_qty(2)]);
        assert_eq!(shown(&engine, "L1"), cached(&engine, "L1"));
    }

    #[test]
    fn test_increment_at_max_quantity_saturates() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();
        let key = ItemKey::new(None, "Milk");
        assert_eq!(engine.update_qty("L1", &key, "99999999999").unwrap(), u32::MAX);

        let AddOutcome::Duplicate(dup) = engine.add_item("L1", "Milk", 1, None).unwrap() else {
            panic!("expected duplicate");
        };
        let outcome = engine.resolve_duplicate(&dup, DuplicateChoice::Increment).unwrap();

        assert_eq!(outcome, AddOutcome::Incremented { qty: u32::MAX });
        assert_eq!(cached(&engine, "L1"), vec![ItemRecord::new("Milk").with_qty(u32::MAX)]);
        assert_eq!(shown(&engine, "L1"), cached(&engine, "L1"));
    }

    #[test]
    fn test_duplicate_abort_changes_nothing() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();
        let before = cached(&engine, "L1");

        let AddOutcome::Duplicate(dup) = engine.add_item("L1", "MILK", 1, None).unwrap() else {
            panic!("expected duplicate");
        };
        let outcome = engine.resolve_duplicate(&dup, DuplicateChoice::Abort).unwrap();

        assert_eq!(outcome, AddOutcome::Aborted);
        assert_eq!(cached(&engine, "L1"), before);
    }

    #[test]
    fn test_exact_name_match_allows_case_variants() {
        let mut engine = ListSyncEngine::bootstrap(
            ListCache::new(MemoryStore::new()),
            empty_list_view(),
            EngineOptions {
                name_match: NameMatch::Exact,
                ..Default::default()
            },
        )
        .unwrap();

        engine.add_item("L1", "Milk", 1, None).unwrap();
        assert_eq!(engine.add_item("L1", "milk", 1, None).unwrap(), AddOutcome::Added);
        assert_eq!(cached(&engine, "L1").len(), 2);
    }

    #[test]
    fn test_update_qty_parses_input() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Eggs", 1, None).unwrap();
        let key = ItemKey::by_name("Eggs");

        assert_eq!(engine.update_qty("L1", &key, "12").unwrap(), 12);
        assert_eq!(cached(&engine, "L1")[0].qty, 12);

        assert_eq!(engine.update_qty("L1", &key, "-4").unwrap(), 1);
        assert_eq!(engine.update_qty("L1", &key, "abc").unwrap(), 1);
        assert_eq!(shown(&engine, "L1"), cached(&engine, "L1"));
    }

    #[test]
    fn test_update_qty_missing_item() {
        let mut engine = engine(empty_list_view());
        let err = engine
            .update_qty("L1", &ItemKey::by_name("Ghost"), "2")
            .unwrap_err();
        assert!(matches!(err, ListError::ItemNotFound { .. }));
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Clean);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();
        engine.add_item("L1", "Eggs", 1, None).unwrap();

        assert!(engine.remove_item("L1", &ItemKey::by_name("Milk")).unwrap());
        let after_first = cached(&engine, "L1");
        assert!(!engine.remove_item("L1", &ItemKey::by_name("Milk")).unwrap());

        assert_eq!(cached(&engine, "L1"), after_first);
        assert_eq!(after_first, vec![ItemRecord::new("Eggs")]);
        assert_eq!(shown(&engine, "L1"), after_first);
    }

    #[test]
    fn test_remove_missing_item_does_not_mark_dirty() {
        let mut engine = engine(empty_list_view());
        assert!(!engine.remove_item("L1", &ItemKey::by_name("Milk")).unwrap());
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Clean);
        assert!(!engine.cache().is_dirty("L1").unwrap());
    }

    #[test]
    fn test_cache_tracks_view_across_mutations() {
        let mut engine = engine(empty_list_view());
        let steps: Vec<Box<dyn Fn(&mut ListSyncEngine<MemoryStore>)>> = vec![
            Box::new(|e| {
                e.add_item("L1", "Milk", 1, None).unwrap();
            }),
            Box::new(|e| {
                e.add_item("L1", "Bread", 2, None).unwrap();
            }),
            Box::new(|e| {
                e.update_qty("L1", &ItemKey::by_name("Milk"), "3").unwrap();
            }),
            Box::new(|e| {
                e.remove_item("L1", &ItemKey::by_name("Bread")).unwrap();
            }),
            Box::new(|e| {
                e.add_item("L1", "Apples", 1, None).unwrap();
            }),
        ];

        for step in steps {
            step(&mut engine);
            assert_eq!(shown(&engine, "L1"), cached(&engine, "L1"));
        }
    }

    #[test]
    fn test_successful_save_replaces_cache() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 2, None).unwrap();

        let ticket = engine.begin_save("L1").unwrap().unwrap();
        assert_eq!(ticket.payload.items, vec![ItemRecord::new("Milk").with_qty(2)]);
        assert!(engine.card("L1").unwrap().save.is_saving());

        let response = rows(json!([{"ItemID": 5, "Name": "Milk", "Qty": 2, "ListID": "L1"}]));
        let now = Instant::now();
        let outcome = engine.finish_save(ticket, Ok(response), now).unwrap();

        assert!(matches!(outcome, SaveOutcome::Saved { items: 1, pending: false }));
        let record = engine.cache().get("L1").unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"list_id": "L1", "items": [{"id": 5, "name": "Milk", "qty": 2}]})
        );
        assert_eq!(engine.card("L1").unwrap().rows[0].item_id, Some(5));
        assert!(!engine.cache().is_dirty("L1").unwrap());
        assert_eq!(engine.card("L1").unwrap().save.label(), "💾 Saved");

        engine.tick(now + Duration::from_secs(2));
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Clean);
    }

    #[test]
    fn test_second_save_while_saving_is_noop() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();

        assert!(engine.begin_save("L1").unwrap().is_some());
        assert!(engine.begin_save("L1").unwrap().is_none());
        assert!(engine.is_saving("L1"));
    }

    #[test]
    fn test_failed_save_leaves_state_untouched() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();
        let cache_before = cached(&engine, "L1");
        let rows_before = engine.card("L1").unwrap().rows.clone();

        let ticket = engine.begin_save("L1").unwrap().unwrap();
        let now = Instant::now();
        let outcome = engine
            .finish_save(ticket, Err(TransportError::Status(500)), now)
            .unwrap();

        assert!(matches!(outcome, SaveOutcome::Failed(TransportError::Status(500))));
        assert_eq!(cached(&engine, "L1"), cache_before);
        assert_eq!(engine.card("L1").unwrap().rows, rows_before);
        assert_eq!(engine.card("L1").unwrap().save.label(), "💾 Save Failed");

        engine.tick(now + Duration::from_secs(3));
        assert_eq!(engine.card("L1").unwrap().save.label(), "💾 Save Changes");
    }

    #[test]
    fn test_edits_during_save_survive_response() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();

        let ticket = engine.begin_save("L1").unwrap().unwrap();
        engine.add_item("L1", "Bread", 1, None).unwrap();
        engine.update_qty("L1", &ItemKey::by_name("Milk"), "3").unwrap();
        assert!(engine.card("L1").unwrap().save.is_saving());
        assert_eq!(ticket.payload.items, vec![ItemRecord::new("Milk")]);

        let response = rows(json!([{"ItemID": 5, "Name": "Milk", "Qty": 1}]));
        let now = Instant::now();
        let outcome = engine.finish_save(ticket, Ok(response), now).unwrap();

        assert!(matches!(outcome, SaveOutcome::Saved { pending: true, .. }));
        assert_eq!(
            cached(&engine, "L1"),
            vec![
                ItemRecord::new("Milk").with_id(5).with_qty(3),
                ItemRecord::new("Bread"),
            ]
        );
        assert_eq!(shown(&engine, "L1"), cached(&engine, "L1"));
        assert!(engine.cache().is_dirty("L1").unwrap());

        engine.tick(now + Duration::from_secs(2));
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Dirty);
    }

    #[test]
    fn test_save_without_cache_entry_sends_empty_set() {
        let mut engine = engine(empty_list_view());
        let ticket = engine.begin_save("L1").unwrap().unwrap();
        assert!(ticket.payload.items.is_empty());
        assert!(engine.begin_save("missing").is_err());
    }

    #[test]
    fn test_mark_dirty_suppressed_while_saving() {
        let mut engine = engine(empty_list_view());
        engine.begin_save("L1").unwrap();

        engine.mark_dirty("L1").unwrap();

        assert!(engine.card("L1").unwrap().save.is_saving());
        assert!(!engine.cache().is_dirty("L1").unwrap());
    }

    #[test]
    fn test_bootstrap_seeds_cache_from_view() {
        let view = ViewState::from_rows(&rows(json!([
            {"ItemID": 1, "ListID": "L1", "Name": "Milk", "Qty": 2, "ListName": "Weekly",
             "ListFreq": "weekly", "TargetDate": "0001-01-01T00:00:00Z"},
            {"ItemID": 2, "ListID": "L1", "Name": "Eggs", "Qty": 12, "ListName": "Weekly"}
        ])));
        let engine = engine(view);

        assert_eq!(
            cached(&engine, "L1"),
            vec![
                ItemRecord::new("Milk").with_id(1).with_qty(2),
                ItemRecord::new("Eggs").with_id(2).with_qty(12),
            ]
        );
        let meta = engine.cache().get_meta("L1").unwrap().unwrap();
        assert_eq!(meta.name, "Weekly");
        assert_eq!(meta.target_date, None);
        assert!(engine.card("L1").unwrap().expanded);
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Clean);
    }

    #[test]
    fn test_bootstrap_merges_unrendered_items_once() {
        let mut cache = ListCache::new(MemoryStore::new());
        cache
            .put(
                "L1",
                &ListRecord::new("L1").with_items(vec![
                    ItemRecord::new("Milk").with_id(1).with_qty(2),
                    ItemRecord::new("Bread"),
                ]),
            )
            .unwrap();
        let view = ViewState::from_rows(&rows(json!([
            {"ItemID": 1, "ListID": "L1", "Name": "Milk", "Qty": 2, "ListName": "Weekly"}
        ])));

        let engine = ListSyncEngine::bootstrap(cache, view, EngineOptions::default()).unwrap();

        let card = engine.card("L1").unwrap();
        assert_eq!(
            card.rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["Milk", "Bread"]
        );
        assert_eq!(cached(&engine, "L1").len(), 2);
        assert_eq!(card.save, SaveStatus::Dirty);
    }

    #[test]
    fn test_bootstrap_restores_cache_only_lists() {
        let mut cache = ListCache::new(MemoryStore::new());
        cache
            .put(
                "abcdef123456",
                &ListRecord::new("abcdef123456").with_items(vec![ItemRecord::new("Rice")]),
            )
            .unwrap();
        cache.put("L2", &ListRecord::new("L2")).unwrap();
        cache.put_meta("L2", &ListMetadata::new("Party")).unwrap();
        cache.set_dirty("abcdef123456", true).unwrap();

        let engine =
            ListSyncEngine::bootstrap(cache, ViewState::new(), EngineOptions::default()).unwrap();

        let restored = engine.card("abcdef123456").unwrap();
        assert_eq!(restored.name, "List abcdef12...");
        assert_eq!(restored.rows.len(), 1);
        assert!(!restored.expanded);
        assert_eq!(restored.save, SaveStatus::Dirty);

        // Cards follow key order, so "L2" sorts first and is expanded.
        let party = engine.card("L2").unwrap();
        assert_eq!(party.name, "Party");
        assert!(party.expanded);
        assert_eq!(party.save, SaveStatus::Clean);
    }

    #[test]
    fn test_insert_created_list_in_place() {
        let mut engine = engine(empty_list_view());
        let created: CreatedList = serde_json::from_value(json!({
            "id": "L9", "name": "Party", "frequency": "", "target_date": "0001-01-01T00:00:00Z"
        }))
        .unwrap();

        engine.insert_created_list(&created, CreateMode::InPlace).unwrap();

        assert_eq!(engine.cache().get("L9").unwrap(), Some(ListRecord::new("L9")));
        let meta = engine.cache().get_meta("L9").unwrap().unwrap();
        assert_eq!(meta.frequency, None);
        assert_eq!(meta.target_date, None);
        let card = engine.card("L9").unwrap();
        assert!(card.expanded);
        assert_eq!(engine.view().expanded().unwrap().list_id, "L9");
    }

    #[test]
    fn test_insert_created_list_reload() {
        let mut engine = engine(empty_list_view());
        engine.add_item("L1", "Milk", 1, None).unwrap();
        let created: CreatedList =
            serde_json::from_value(json!({"id": "L9", "name": "Party"})).unwrap();

        engine.insert_created_list(&created, CreateMode::Reload).unwrap();

        let ids: Vec<&str> = engine.view().cards.iter().map(|c| c.list_id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "L9"]);
        assert_eq!(shown(&engine, "L1"), vec![ItemRecord::new("Milk")]);
        assert_eq!(engine.card("L1").unwrap().save, SaveStatus::Dirty);
        assert_eq!(engine.view().expanded().unwrap().list_id, "L1");
    }
}
