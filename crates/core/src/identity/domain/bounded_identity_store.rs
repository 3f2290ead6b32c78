use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use thiserror::Error;

use crate::capture::domain::artifact_store::ArtifactKind;
use crate::capture::domain::capture_recorder::CaptureRecorder;
use crate::identity::domain::description::ConsolidatedDescription;
use crate::identity::domain::identity_record::{
    IdentityListing, IdentityRecord, BODY_DIR, CREATED_AT, DESCRIPTION, FACE_DIR, UPDATED_AT,
};
use crate::identity::domain::record_store::{Fields, RecordStore, StoreError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A failed write. `evicted` lists ids already removed to make room before
/// the failure; their in-memory state must still be dropped.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct RecordError {
    pub evicted: Vec<u32>,
    #[source]
    pub source: StoreError,
}

/// Record store with a population ceiling.
///
/// Admitting an unseen id while the population is at the ceiling first
/// evicts the smallest ids (record and artifacts). The whole
/// check-evict-insert sequence runs under one lock.
pub struct BoundedIdentityStore {
    records: Arc<dyn RecordStore>,
    recorder: Arc<CaptureRecorder>,
    ceiling: usize,
    lock: Mutex<()>,
}

impl BoundedIdentityStore {
    pub fn new(records: Arc<dyn RecordStore>, recorder: Arc<CaptureRecorder>, ceiling: usize) -> Self {
        Self {
            records,
            recorder,
            ceiling: ceiling.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Merges `fields` into the record of `track_id`, admitting it if new.
    ///
    /// Returns the ids evicted to make room, smallest first.
    pub fn record(&self, track_id: u32, fields: Fields) -> Result<Vec<u32>, RecordError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut evicted = Vec::new();
        match self.admit(track_id, fields, &mut evicted) {
            Ok(()) => Ok(evicted),
            Err(source) => Err(RecordError { evicted, source }),
        }
    }

    /// Records the directory a crop of `kind` was stored in.
    pub fn record_artifact_dir(
        &self,
        track_id: u32,
        kind: ArtifactKind,
        dir: &Path,
    ) -> Result<Vec<u32>, RecordError> {
        let key = match kind {
            ArtifactKind::Body => BODY_DIR,
            ArtifactKind::Face => FACE_DIR,
        };
        let mut fields = Fields::new();
        fields.insert(key.to_string(), Value::String(dir.display().to_string()));
        self.record(track_id, fields)
    }

    /// Replaces the stored description wholesale.
    pub fn record_description(
        &self,
        track_id: u32,
        description: &ConsolidatedDescription,
    ) -> Result<Vec<u32>, RecordError> {
        let mut fields = Fields::new();
        fields.insert(DESCRIPTION.to_string(), description.to_value());
        self.record(track_id, fields)
    }

    pub fn get(&self, track_id: u32) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self
            .records
            .get(track_id)?
            .map(|fields| IdentityRecord::from_fields(track_id, &fields)))
    }

    pub fn description(&self, track_id: u32) -> Result<Option<ConsolidatedDescription>, StoreError> {
        Ok(self.get(track_id)?.and_then(|r| r.description))
    }

    pub fn population(&self) -> Result<usize, StoreError> {
        Ok(self.records.get_all()?.len())
    }

    /// Every identity with the image files found in its directories.
    pub fn list_identities(&self) -> Result<Vec<IdentityListing>, StoreError> {
        Ok(self
            .records
            .get_all()?
            .into_iter()
            .map(|(id, fields)| IdentityListing {
                record: IdentityRecord::from_fields(id, &fields),
                body_images: self.recorder.artifacts(id, ArtifactKind::Body),
                face_images: self.recorder.artifacts(id, ArtifactKind::Face),
            })
            .collect())
    }

    fn admit(
        &self,
        track_id: u32,
        mut fields: Fields,
        evicted: &mut Vec<u32>,
    ) -> Result<(), StoreError> {
        let now = Value::String(chrono::Local::now().format(TIMESTAMP_FORMAT).to_string());
        if self.records.get(track_id)?.is_none() {
            self.make_room(evicted)?;
            fields.insert(CREATED_AT.to_string(), now.clone());
            log::info!("Track {track_id}: admitted to identity store");
        }
        fields.insert(UPDATED_AT.to_string(), now);
        self.records.put(track_id, fields)
    }

    /// Evicts the smallest ids until one more fits, pushing each onto
    /// `evicted` as soon as its record is gone.
    fn make_room(&self, evicted: &mut Vec<u32>) -> Result<(), StoreError> {
        let ids: Vec<u32> = self
            .records
            .get_all()?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let excess = (ids.len() + 1).saturating_sub(self.ceiling);

        for &id in ids.iter().take(excess) {
            self.recorder.purge(id);
            self.records.delete(id)?;
            log::info!(
                "Track {id}: evicted from identity store (ceiling {})",
                self.ceiling
            );
            evicted.push(id);
        }
        Ok(())
    }
}
