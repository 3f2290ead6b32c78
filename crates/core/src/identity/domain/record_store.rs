use std::path::PathBuf;

use thiserror::Error;

/// Named record fields. Writes merge field by field.
pub type Fields = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Keyed record storage used by the identity store.
pub trait RecordStore: Send + Sync {
    /// Upsert: fields present in `fields` overwrite, others are kept.
    fn put(&self, id: u32, fields: Fields) -> Result<(), StoreError>;

    fn get(&self, id: u32) -> Result<Option<Fields>, StoreError>;

    /// Every record in ascending id order.
    fn get_all(&self) -> Result<Vec<(u32, Fields)>, StoreError>;

    /// Returns whether a record was removed.
    fn delete(&self, id: u32) -> Result<bool, StoreError>;
}
