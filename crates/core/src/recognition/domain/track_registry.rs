use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::recognition::domain::face_gallery::FaceGallery;
use crate::shared::constants::GALLERY_CAPACITY;

/// Mutable per-track state shared by the matcher and the sample batcher.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackState {
    pub gallery: FaceGallery,
    /// Shoulder midpoint x of the last accepted frontal (or seeding) frame.
    pub body_center_x: Option<f64>,
    /// Successful body captures; only ever incremented.
    pub accepted_samples: usize,
}

impl TrackState {
    pub fn new(gallery_capacity: usize) -> Self {
        Self {
            gallery: FaceGallery::new(gallery_capacity),
            body_center_x: None,
            accepted_samples: 0,
        }
    }
}

/// Identity-keyed store of [`TrackState`], one lock per track.
///
/// The outer map lock is held only long enough to find or create a
/// track's slot, so work on different ids never contends.
pub struct TrackRegistry {
    tracks: Mutex<HashMap<u32, Arc<Mutex<TrackState>>>>,
    gallery_capacity: usize,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::with_gallery_capacity(GALLERY_CAPACITY)
    }

    pub fn with_gallery_capacity(gallery_capacity: usize) -> Self {
        Self {
            tracks: Mutex::new(HashMap::new()),
            gallery_capacity,
        }
    }

    /// Runs `f` with exclusive access to the state of `track_id`,
    /// creating an empty state on first use.
    pub fn with_track<R>(&self, track_id: u32, f: impl FnOnce(&mut TrackState) -> R) -> R {
        let slot = self.slot(track_id);
        let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Copy of the current state, if the track is known.
    pub fn snapshot(&self, track_id: u32) -> Option<TrackState> {
        let slot = self.map().get(&track_id).cloned()?;
        let state = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(state.clone())
    }

    /// Forgets a track. In-flight holders of its lock finish on a detached
    /// copy that is then dropped.
    pub fn remove(&self, track_id: u32) -> bool {
        self.map().remove(&track_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn slot(&self, track_id: u32) -> Arc<Mutex<TrackState>> {
        let capacity = self.gallery_capacity;
        self.map()
            .entry(track_id)
            .or_insert_with(|| Arc::new(Mutex::new(TrackState::new(capacity))))
            .clone()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<u32, Arc<Mutex<TrackState>>>> {
        self.tracks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
