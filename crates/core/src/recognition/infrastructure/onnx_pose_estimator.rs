//! Body pose from a YOLO-pose ONNX model (COCO 17-keypoint layout).
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::face_analyzer::ModelError;
use crate::recognition::domain::orientation::{Landmark, PoseLandmarks};
use crate::recognition::domain::pose_estimator::PoseEstimator;
use crate::shared::frame::Frame;

use super::yolo;

/// Default confidence for accepting a person detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

const KEYPOINT_OFFSET: usize = 5;
const NOSE: usize = 0;
const LEFT_SHOULDER: usize = 5;
const RIGHT_SHOULDER: usize = 6;

pub struct OnnxPoseEstimator {
    session: Mutex<ort::session::Session>,
    input_size: u32,
    confidence: f64,
}

impl OnnxPoseEstimator {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, ModelError> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        let input_size = yolo::input_size(&session);
        Ok(Self {
            session: Mutex::new(session),
            input_size,
            confidence,
        })
    }
}

impl PoseEstimator for OnnxPoseEstimator {
    fn estimate(&self, frame: &Frame) -> Result<Option<PoseLandmarks>, ModelError> {
        let rgb = frame.to_rgb().ok_or("Unsupported pixel layout")?;
        let lb = yolo::letterbox(&rgb, self.input_size).ok_or("Frame cannot be letterboxed")?;
        let input_value = ort::value::Tensor::from_array(lb.tensor.clone())?;

        let rows = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("Pose model produced no outputs".into());
            }
            let tensor = outputs[0].try_extract_array::<f32>()?;
            let shape = tensor.shape().to_vec();
            let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
            yolo::rows(data, &shape)?
        };

        // Highest-confidence person wins; the crop is expected to hold one.
        let best = yolo::nms(
            yolo::candidates(rows, &lb, self.confidence),
            yolo::NMS_IOU_THRESH,
        )
        .into_iter()
        .next();

        Ok(best.and_then(|c| landmarks_from_row(&c.row, &lb, rgb.width(), rgb.height())))
    }
}

/// Reads nose and shoulders from a pose row, normalized to `[0, 1]`.
fn landmarks_from_row(
    row: &[f32],
    lb: &yolo::Letterbox,
    width: u32,
    height: u32,
) -> Option<PoseLandmarks> {
    let keypoint = |k: usize| -> Option<Landmark> {
        let base = KEYPOINT_OFFSET + k * 3;
        let kp = row.get(base..base + 3)?;
        let (x, y) = lb.to_frame(kp[0] as f64, kp[1] as f64);
        Some(Landmark::new(
            x / width.max(1) as f64,
            y / height.max(1) as f64,
            kp[2] as f64,
        ))
    };

    Some(PoseLandmarks {
        nose: keypoint(NOSE)?,
        left_shoulder: keypoint(LEFT_SHOULDER)?,
        right_shoulder: keypoint(RIGHT_SHOULDER)?,
    })
}
