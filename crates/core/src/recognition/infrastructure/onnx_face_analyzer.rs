/// Face detection and ArcFace embedding using ONNX Runtime via `ort`.
///
/// A YOLO face model proposes boxes; each box is cropped and passed
/// through an ArcFace model to produce an L2-normalized embedding.
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::face_analyzer::{DetectedFace, FaceAnalyzer, ModelError};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

use super::yolo;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const EMBED_INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxFaceAnalyzer {
    detector: Mutex<ort::session::Session>,
    embedder: Mutex<ort::session::Session>,
    input_size: u32,
    confidence: f64,
}

impl OnnxFaceAnalyzer {
    pub fn new(
        detector_path: &Path,
        embedder_path: &Path,
        confidence: f64,
    ) -> Result<Self, ModelError> {
        let detector = ort::session::Session::builder()?.commit_from_file(detector_path)?;
        let input_size = yolo::input_size(&detector);

        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let embedder = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(embedder_path)?;

        Ok(Self {
            detector: Mutex::new(detector),
            embedder: Mutex::new(embedder),
            input_size,
            confidence,
        })
    }

    fn detect(&self, rgb: &Frame) -> Result<Vec<FaceBox>, ModelError> {
        let lb = yolo::letterbox(rgb, self.input_size).ok_or("Frame cannot be letterboxed")?;
        let input_value = ort::value::Tensor::from_array(lb.tensor.clone())?;

        let rows = {
            let mut session = self
                .detector
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("Face model produced no outputs".into());
            }
            let tensor = outputs[0].try_extract_array::<f32>()?;
            let shape = tensor.shape().to_vec();
            let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
            yolo::rows(data, &shape)?
        };

        log::debug!("Face model: {} raw rows", rows.len());
        let kept = yolo::nms(
            yolo::candidates(rows, &lb, self.confidence),
            yolo::NMS_IOU_THRESH,
        );
        Ok(kept.iter().map(|c| FaceBox::from_f64(c.bbox)).collect())
    }

    fn embed(&self, crop: &Frame) -> Result<Embedding, ModelError> {
        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .embedder
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;
        Ok(Embedding::normalized(embedding_slice.to_vec()))
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(&self, frame: &Frame) -> Result<Vec<DetectedFace>, ModelError> {
        let rgb = frame.to_rgb().ok_or("Unsupported pixel layout")?;
        let mut faces = Vec::new();
        for bbox in self.detect(&rgb)? {
            let Some(crop) = rgb.crop(&bbox) else {
                continue;
            };
            let embedding = self.embed(&crop)?;
            faces.push(DetectedFace { bbox, embedding });
        }
        Ok(faces)
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = (width as usize).max(1);
    let src_h = (height as usize).max(1);
    let size = EMBED_INPUT_SIZE;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / size as f64) as usize).min(src_h - 1);
        for x in 0..size {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / size as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }
    tensor
}
