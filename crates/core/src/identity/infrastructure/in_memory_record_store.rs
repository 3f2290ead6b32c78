use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::identity::domain::record_store::{Fields, RecordStore, StoreError};

/// Process-local record store.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<BTreeMap<u32, Fields>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn put(&self, id: u32, fields: Fields) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.entry(id).or_default().extend(fields);
        Ok(())
    }

    fn get(&self, id: u32) -> Result<Option<Fields>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&id).cloned())
    }

    fn get_all(&self) -> Result<Vec<(u32, Fields)>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().map(|(id, f)| (*id, f.clone())).collect())
    }

    fn delete(&self, id: u32) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.remove(&id).is_some())
    }
}
