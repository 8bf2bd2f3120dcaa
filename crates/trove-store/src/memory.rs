use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::RwLock;

use tracing::debug;
use trove_types::{Key, KeyId, Record};

use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

/// In-memory, HashMap-based record store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` for
/// safe concurrent access and cloned on read/write. Ids for incomplete keys
/// come from a single counter shared by all kinds, starting at 1.
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<Key, Record>>,
    next_id: AtomicI64,
    read_only: AtomicBool,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    /// Reject writes and deletes with [`StoreError::ReadOnly`] while set.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.is_read_only() {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Remove all records. The id counter is not reset.
    pub fn clear(&self) {
        self.records.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all stored keys.
    pub fn all_keys(&self) -> Vec<Key> {
        let map = self.records.read().expect("lock poisoned");
        let mut keys: Vec<Key> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Dump every record as a JSON array, ordered by key.
    pub fn to_json(&self) -> StoreResult<String> {
        let map = self.records.read().expect("lock poisoned");
        let mut records: Vec<&Record> = map.values().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        serde_json::to_string_pretty(&records).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Build a store from the output of [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let records: Vec<Record> =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let store = Self::new();
        for record in records {
            store.put(&record)?;
        }
        Ok(store)
    }

    /// Allocated ids always stay above every integer id written so far.
    fn complete(&self, key: &Key) -> Key {
        if let Some(KeyId::Int(id)) = key.id() {
            self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
            key.clone()
        } else if key.is_complete() {
            key.clone()
        } else {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            debug!(kind = key.kind(), id, "allocated id");
            key.with_id(id)
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn put(&self, record: &Record) -> StoreResult<Key> {
        self.check_writable()?;
        let key = self.complete(&record.key);
        let mut stored = record.clone();
        stored.key = key.clone();
        let mut map = self.records.write().expect("lock poisoned");
        map.insert(key.clone(), stored);
        Ok(key)
    }

    fn get(&self, key: &Key) -> StoreResult<Option<Record>> {
        if !key.is_complete() {
            return Err(StoreError::IncompleteKey(key.clone()));
        }
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn delete(&self, key: &Key) -> StoreResult<bool> {
        if !key.is_complete() {
            return Err(StoreError::IncompleteKey(key.clone()));
        }
        self.check_writable()?;
        let mut map = self.records.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &count)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
