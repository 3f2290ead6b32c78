use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::ingest::domain::frame_cache::FrameCache;

/// Frame cache held in process memory.
#[derive(Default)]
pub struct InMemoryFrameCache {
    frames: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, payload: Vec<u8>) {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), payload);
    }

    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

impl FrameCache for InMemoryFrameCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
