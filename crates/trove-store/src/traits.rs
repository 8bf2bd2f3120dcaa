use trove_types::{Key, Record};

use crate::error::{StoreError, StoreResult};

/// Key-value persistence boundary for records.
///
/// All implementations must satisfy these invariants:
/// - A record written with an incomplete key gets an id allocated by the
///   store; the completed key is returned and the record is stored under it.
/// - A record written with a complete key replaces whatever was stored there.
/// - `get` returns `Ok(None)` for keys that were never written or were deleted.
pub trait RecordStore: Send + Sync {
    /// Write a record and return the key it was stored under.
    fn put(&self, record: &Record) -> StoreResult<Key>;

    /// Read the record stored under `key`.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    fn get(&self, key: &Key) -> StoreResult<Option<Record>>;

    /// Read the record stored under `key`, failing with
    /// [`StoreError::NotFound`] if there is none.
    fn get_required(&self, key: &Key) -> StoreResult<Record> {
        self.get(key)?.ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// Delete a record. Returns `true` if it existed.
    fn delete(&self, key: &Key) -> StoreResult<bool>;

    /// Write multiple records and return their keys in input order.
    ///
    /// Default implementation calls `put()` for each record.
    fn put_batch(&self, records: &[Record]) -> StoreResult<Vec<Key>> {
        records.iter().map(|record| self.put(record)).collect()
    }

    /// Read multiple records in input order.
    ///
    /// Default implementation calls `get()` for each key.
    fn get_batch(&self, keys: &[Key]) -> StoreResult<Vec<Option<Record>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}
