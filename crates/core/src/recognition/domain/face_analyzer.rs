use crate::recognition::domain::embedding::Embedding;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Error type for model-backed adapters, shareable across worker threads.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bbox: FaceBox,
    pub embedding: Embedding,
}

/// Domain interface for face detection plus embedding.
///
/// Faces are returned in the detector's confidence order, best first.
/// Shared by every ingest worker, hence `&self` and `Sync`.
pub trait FaceAnalyzer: Send + Sync {
    fn analyze(&self, frame: &Frame) -> Result<Vec<DetectedFace>, ModelError>;
}
