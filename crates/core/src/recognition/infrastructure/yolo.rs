//! Pre- and post-processing shared by the YOLO-family ONNX models.

use crate::shared::frame::Frame;

/// Fallback input resolution when the model shape is dynamic.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
pub const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox-resized NCHW tensor plus the mapping back to frame pixels.
pub struct Letterbox {
    pub tensor: ndarray::Array4<f32>,
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Maps a point from model input space back to frame pixels.
    pub fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize an RGB frame to `target_size` x `target_size`,
/// padding with YOLO gray (114).
pub fn letterbox(frame: &Frame, target_size: u32) -> Option<Letterbox> {
    let src = frame.as_ndarray()?;
    if frame.is_empty() || frame.channels() < 3 {
        return None;
    }
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Some(Letterbox {
        tensor,
        scale,
        pad_x,
        pad_y,
    })
}

/// Reads the square input size from an NCHW model input, if static.
pub fn input_size(session: &ort::session::Session) -> u32 {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(DEFAULT_INPUT_SIZE)
}

/// Splits a `[1, features, detections]` or `[1, detections, features]`
/// output into per-detection rows.
pub fn rows(data: &[f32], shape: &[usize]) -> Result<Vec<Vec<f32>>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output has {} values, expected {}",
            data.len(),
            num_dets * num_feats
        ));
    }

    Ok((0..num_dets)
        .map(|i| {
            if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            }
        })
        .collect())
}

/// Box in frame pixels with its score and the raw row it came from.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub row: Vec<f32>,
}

/// Converts rows `[cx, cy, w, h, conf, ...]` above `min_conf` into
/// frame-space candidates.
pub fn candidates(rows: Vec<Vec<f32>>, lb: &Letterbox, min_conf: f64) -> Vec<Candidate> {
    rows.into_iter()
        .filter(|row| row.len() >= 5 && row[4] as f64 >= min_conf)
        .map(|row| {
            let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
            let (x1, y1) = lb.to_frame(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = lb.to_frame(cx + w / 2.0, cy + h / 2.0);
            Candidate {
                bbox: [x1, y1, x2, y2],
                confidence: row[4] as f64,
                row,
            }
        })
        .collect()
}

/// Greedy NMS: highest confidence first, suppress overlapping boxes.
pub fn nms(mut dets: Vec<Candidate>, iou_thresh: f64) -> Vec<Candidate> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for det in dets {
        if keep.iter().all(|k| bbox_iou(&k.bbox, &det.bbox) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(bbox: [f64; 4], confidence: f64) -> Candidate {
        Candidate {
            bbox,
            confidence,
            row: Vec::new(),
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3);
        let lb = letterbox(&frame, 640).unwrap();
        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert!((lb.scale - 3.2).abs() < 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_pads_with_gray() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3);
        let lb = letterbox(&frame, 640).unwrap();
        let y = lb.pad_y as usize + 1;
        assert!((lb.tensor[[0, 0, y, 1]] - 1.0).abs() < 0.01);
        assert!((lb.tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_letterbox_rejects_gray_frames() {
        let frame = Frame::new(vec![0u8; 4], 2, 2, 1);
        assert!(letterbox(&frame, 64).is_none());
    }

    #[test]
    fn test_to_frame_inverts_letterbox() {
        let frame = Frame::new(vec![0u8; 200 * 100 * 3], 200, 100, 3);
        let lb = letterbox(&frame, 640).unwrap();
        let (x, y) = lb.to_frame(320.0, 320.0);
        assert!((x - 100.0).abs() < 0.01);
        assert!((y - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_rows_handles_transposed_layout() {
        // 2 features x 3 detections
        let data = vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        let rows = rows(&data, &[1, 2, 3]).unwrap();
        assert_eq!(rows, vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]);
    }

    #[test]
    fn test_rows_handles_row_major_layout() {
        // 3 detections x 2 features
        let data = vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        let rows = rows(&data, &[1, 3, 2]).unwrap();
        assert_eq!(rows[1], vec![2.0, 20.0]);
    }

    #[test]
    fn test_rows_rejects_bad_shape() {
        assert!(rows(&[0.0; 4], &[4]).is_err());
        assert!(rows(&[0.0; 4], &[1, 3, 5]).is_err());
    }

    #[test]
    fn test_candidates_filter_by_confidence() {
        let frame = Frame::new(vec![0u8; 64 * 64 * 3], 64, 64, 3);
        let lb = letterbox(&frame, 64).unwrap();
        let rows = vec![
            vec![32.0, 32.0, 10.0, 10.0, 0.9],
            vec![10.0, 10.0, 4.0, 4.0, 0.1],
        ];
        let kept = candidates(rows, &lb, 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox, [27.0, 27.0, 37.0, 37.0]);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let kept = nms(
            vec![
                candidate([0.0, 0.0, 100.0, 100.0], 0.8),
                candidate([5.0, 5.0, 105.0, 105.0], 0.9),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let kept = nms(
            vec![
                candidate([0.0, 0.0, 50.0, 50.0], 0.9),
                candidate([200.0, 200.0, 250.0, 250.0], 0.8),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let iou = bbox_iou(&[0.0, 0.0, 10.0, 10.0], &[5.0, 5.0, 15.0, 15.0]);
        assert!((iou - 25.0 / 175.0).abs() < 1e-9);
    }
}
