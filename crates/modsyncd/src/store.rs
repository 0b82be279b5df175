//! Shared store table abstraction.
//!
//! The daemon publishes into named tables of a shared key/value store.
//! The wire protocol of the real store is out of scope; [`Table`] is
//! the seam, and [`MemTable`] is the in-process implementation used by
//! the binary's simulation mode and by tests. Keys map to a flat set
//! of field/value pairs, last write wins.

use std::collections::BTreeMap;
use std::sync::Mutex;

use modsync_core::StoreError;

/// One named table in the shared store.
///
/// Implementations must be safe to share between the main loop and the
/// coordinator worker; each operation is individually atomic, there is
/// no multi-key transaction.
pub trait Table: Send + Sync {
    /// Creates or replaces the record at `key` with `fields`.
    fn set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Deletes the record at `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every key currently present in the table.
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Reads the record at `key`, if present.
    fn get(&self, key: &str) -> Result<Option<BTreeMap<String, String>>, StoreError>;
}

/// In-memory [`Table`] implementation.
#[derive(Default)]
pub struct MemTable {
    records: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
}

impl MemTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, BTreeMap<String, String>>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Operation("table lock poisoned".to_string()))
    }
}

impl Table for MemTable {
    fn set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let record = fields
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        records.insert(key.to_string(), record);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        records.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let records = self.lock()?;
        Ok(records.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<BTreeMap<String, String>>, StoreError> {
        let records = self.lock()?;
        Ok(records.get(key).cloned())
    }
}
