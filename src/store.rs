// src/store.rs

//! In-memory record cache.
//!
//! One writer (the watch task, through the dispatcher) and any number of
//! readers on other threads. Every mutation happens under the write lock in
//! a single step, so readers see either the state before an update or the
//! state after it. Reads hand out clones; nothing a caller holds changes
//! behind its back.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::record::Record;

#[derive(Debug)]
pub struct RecordStore<R> {
    records: RwLock<HashMap<String, R>>,
}

impl<R> Default for RecordStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: Record> RecordStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking listener can't leave the map half-written: writes below
    // never call out while holding the lock.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, R>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, R>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current value for `key`.
    pub fn get(&self, key: &str) -> Option<R> {
        self.read().get(key).cloned()
    }

    /// Point-in-time copy of every record. Order is unspecified.
    pub fn list(&self) -> Vec<R> {
        self.read().values().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Current keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Insert or replace, keyed by the record's own key.
    pub(crate) fn upsert(&self, record: R) -> Option<R> {
        let key = record.key().to_string();
        self.write().insert(key, record)
    }

    pub(crate) fn remove(&self, key: &str) -> Option<R> {
        self.write().remove(key)
    }

    /// Swap the whole content at once (initial fill).
    pub(crate) fn replace_all(&self, records: HashMap<String, R>) {
        *self.write() = records;
    }
}
