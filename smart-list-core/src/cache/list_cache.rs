//! Namespaced list records and metadata on top of a [`KeyValueStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{KeyValueStore, StorageError};
use crate::models::{ListMetadata, ListRecord};

const LIST_PREFIX: &str = "groceryList_";
const META_PREFIX: &str = "groceryListMeta_";
const DIRTY_PREFIX: &str = "groceryListDirty_";

/// Local cache of list contents, one entry per list id.
#[derive(Debug, Clone)]
pub struct ListCache<S> {
    store: S,
}

impl<S: KeyValueStore> ListCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, list_id: &str) -> Result<Option<ListRecord>, StorageError> {
        self.read(&list_key(list_id))
    }

    pub fn put(&mut self, list_id: &str, record: &ListRecord) -> Result<(), StorageError> {
        self.write(&list_key(list_id), record)
    }

    /// Forget everything cached for a list.
    pub fn clear(&mut self, list_id: &str) -> Result<(), StorageError> {
        self.store.remove(&list_key(list_id))?;
        self.store.remove(&meta_key(list_id))?;
        self.store.remove(&dirty_key(list_id))
    }

    pub fn get_meta(&self, list_id: &str) -> Result<Option<ListMetadata>, StorageError> {
        self.read(&meta_key(list_id))
    }

    pub fn put_meta(&mut self, list_id: &str, meta: &ListMetadata) -> Result<(), StorageError> {
        self.write(&meta_key(list_id), meta)
    }

    /// Whether the list has edits that no save has confirmed yet.
    pub fn is_dirty(&self, list_id: &str) -> Result<bool, StorageError> {
        Ok(self.read::<bool>(&dirty_key(list_id))?.unwrap_or(false))
    }

    pub fn set_dirty(&mut self, list_id: &str, dirty: bool) -> Result<(), StorageError> {
        if dirty {
            self.write(&dirty_key(list_id), &true)
        } else {
            self.store.remove(&dirty_key(list_id))
        }
    }

    /// Ids of every list with a cached record, in key order.
    pub fn list_ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(LIST_PREFIX).map(str::to_string))
            .filter(|id| !id.is_empty() && id != "undefined" && id != "null")
            .collect())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Corrupt(key.to_string(), e)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::EncodeError(key.to_string(), e))?;
        self.store.set(key, &raw)
    }
}

fn list_key(list_id: &str) -> String {
    format!("{}{}", LIST_PREFIX, list_id)
}

fn meta_key(list_id: &str) -> String {
    format!("{}{}", META_PREFIX, list_id)
}

fn dirty_key(list_id: &str) -> String {
    format!("{}{}", DIRTY_PREFIX, list_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::models::ItemRecord;

    fn cache() -> ListCache<MemoryStore> {
        ListCache::new(MemoryStore::new())
    }

    #[test]
    fn test_put_and_get_record() {
        let mut cache = cache();
        let record = ListRecord::new("L1").with_items(vec![ItemRecord::new("Milk")]);
        cache.put("L1", &record).unwrap();

        assert_eq!(cache.get("L1").unwrap(), Some(record));
        assert_eq!(cache.get("L2").unwrap(), None);
    }

    #[test]
    fn test_stored_json_shape() {
        let mut cache = cache();
        let record = ListRecord::new("L1").with_items(vec![ItemRecord::new("Milk")]);
        cache.put("L1", &record).unwrap();

        let raw = cache.store().get("groceryList_L1").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"list_id": "L1", "items": [{"id": null, "name": "Milk", "qty": 1}]})
        );
    }

    #[test]
    fn test_list_ids_ignore_other_namespaces() {
        let mut cache = cache();
        cache.put("L1", &ListRecord::new("L1")).unwrap();
        cache.put_meta("L1", &ListMetadata::new("Weekly")).unwrap();
        cache.set_dirty("L1", true).unwrap();
        cache.put("null", &ListRecord::new("null")).unwrap();

        assert_eq!(cache.list_ids().unwrap(), vec!["L1".to_string()]);
    }

    #[test]
    fn test_clear_removes_all_entries() {
        let mut cache = cache();
        cache.put("L1", &ListRecord::new("L1")).unwrap();
        cache.put_meta("L1", &ListMetadata::new("Weekly")).unwrap();
        cache.set_dirty("L1", true).unwrap();

        cache.clear("L1").unwrap();

        assert!(cache.get("L1").unwrap().is_none());
        assert!(cache.get_meta("L1").unwrap().is_none());
        assert!(!cache.is_dirty("L1").unwrap());
        assert!(cache.store().keys().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_entry_is_reported() {
        let mut store = MemoryStore::new();
        store.set("groceryList_L1", "{not json").unwrap();
        let cache = ListCache::new(store);

        let err = cache.get("L1").unwrap_err();
        assert!(err.to_string().contains("groceryList_L1"));
    }
}
