//! Nullable store: thread-safe in-memory record storage for testing.

use gauge_store::{LedgerStore, StoreError, Table};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// An in-memory [`LedgerStore`].
/// Thread-safe so one store can back engines on several threads.
#[derive(Debug, Default)]
pub struct NullLedgerStore {
    tables: Mutex<HashMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>>,
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("store mutex poisoned".into())
}

impl NullLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>>, StoreError> {
        self.tables.lock().map_err(poisoned)
    }

    /// Number of records in `table`.
    pub fn len(&self, table: Table) -> usize {
        self.tables()
            .map(|t| t.get(&table).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        Table::ALL.iter().all(|t| self.len(*t) == 0)
    }
}

impl LedgerStore for NullLedgerStore {
    fn get_record(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tables()?
            .get(&table)
            .and_then(|t| t.get(key))
            .cloned())
    }

    fn put_record(&self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.tables()?
            .entry(table)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete_record(&self, table: Table, key: &[u8]) -> Result<(), StoreError> {
        if let Some(t) = self.tables()?.get_mut(&table) {
            t.remove(key);
        }
        Ok(())
    }

    fn iter_records(&self, table: Table) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .tables()?
            .get(&table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn clear_table(&self, table: Table) -> Result<(), StoreError> {
        self.tables()?.remove(&table);
        Ok(())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.meta
            .lock()
            .map_err(poisoned)?
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
