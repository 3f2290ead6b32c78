use crate::recognition::domain::orientation::{classify, OrientationReading};
use crate::recognition::domain::pose_estimator::PoseEstimator;
use crate::shared::frame::Frame;

/// Runs the pose estimator and reduces its landmarks to an orientation.
pub struct OrientationClassifier {
    estimator: Box<dyn PoseEstimator>,
}

impl OrientationClassifier {
    pub fn new(estimator: Box<dyn PoseEstimator>) -> Self {
        Self { estimator }
    }

    /// Estimator failures are logged and read as `Unknown`.
    pub fn classify(&self, frame: &Frame) -> OrientationReading {
        match self.estimator.estimate(frame) {
            Ok(landmarks) => classify(landmarks.as_ref()),
            Err(e) => {
                log::warn!("Pose estimation failed: {e}");
                OrientationReading::unknown()
            }
        }
    }
}
