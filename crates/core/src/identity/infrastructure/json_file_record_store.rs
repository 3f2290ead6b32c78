use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::identity::domain::record_store::{Fields, RecordStore, StoreError};

/// Record store persisted as one pretty-printed JSON object keyed by id.
///
/// The whole map is rewritten after each mutation via a temp file and a
/// rename, so a crash never leaves a half-written file behind. Memory only
/// changes once the file write has gone through.
pub struct JsonFileRecordStore {
    path: PathBuf,
    records: Mutex<BTreeMap<u32, Fields>>,
}

impl JsonFileRecordStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        log::debug!(
            "Opened record store {} with {} records",
            path.display(),
            records.len()
        );
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &BTreeMap<u32, Fields>) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl RecordStore for JsonFileRecordStore {
    fn put(&self, id: u32, fields: Fields) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = records.clone();
        next.entry(id).or_default().extend(fields);
        self.persist(&next)?;
        *records = next;
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
        let mut next = records.clone();
        if next.remove(&id).is_none() {
            return Ok(false);
        }
        self.persist(&next)?;
        *records = next;
        Ok(true)
    }
}
