use std::collections::VecDeque;

use crate::recognition::domain::embedding::Embedding;

/// Rolling window of reference embeddings for one track.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceGallery {
    embeddings: VecDeque<Embedding>,
    capacity: usize,
}

impl FaceGallery {
    pub fn new(capacity: usize) -> Self {
        Self {
            embeddings: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn embeddings(&self) -> impl Iterator<Item = &Embedding> {
        self.embeddings.iter()
    }

    /// Appends, dropping the oldest entry once over capacity.
    pub fn push(&mut self, embedding: Embedding) {
        self.embeddings.push_back(embedding);
        while self.embeddings.len() > self.capacity {
            self.embeddings.pop_front();
        }
    }

    /// Mean of the stored embeddings at unit length.
    pub fn reference(&self) -> Option<Embedding> {
        let refs: Vec<&Embedding> = self.embeddings.iter().collect();
        Embedding::mean(&refs)
    }
}
