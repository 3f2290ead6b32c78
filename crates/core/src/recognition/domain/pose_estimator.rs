use crate::recognition::domain::face_analyzer::ModelError;
use crate::recognition::domain::orientation::PoseLandmarks;
use crate::shared::frame::Frame;

/// Domain interface for body pose estimation.
///
/// `Ok(None)` means no person was found in the image.
pub trait PoseEstimator: Send + Sync {
    fn estimate(&self, frame: &Frame) -> Result<Option<PoseLandmarks>, ModelError>;
}
