use ndarray::ArrayView3;

use crate::shared::face_box::FaceBox;

/// A decoded image: contiguous pixel bytes in row-major order.
///
/// `channels` is 1 (gray), 2 (gray+alpha), 3 (RGB) or 4 (RGBA). Conversion
/// to RGB happens only at the artifact-writing boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Pixel view shaped `[height, width, channels]`, or `None` when the
    /// buffer does not match the declared dimensions.
    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .ok()
    }

    /// Copies the pixels inside `bbox`, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped box has no area.
    pub fn crop(&self, bbox: &FaceBox) -> Option<Frame> {
        let clamped = bbox.clamp(self.width, self.height)?;
        let (x1, y1, x2, y2) = (
            clamped.x1 as usize,
            clamped.y1 as usize,
            clamped.x2 as usize,
            clamped.y2 as usize,
        );
        let channels = self.channels as usize;
        let row_bytes = self.width as usize * channels;

        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            let start = row * row_bytes + x1 * channels;
            let end = row * row_bytes + x2 * channels;
            data.extend_from_slice(self.data.get(start..end)?);
        }

        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
        ))
    }

    /// Converts gray, gray+alpha or RGBA pixels to packed RGB.
    ///
    /// Returns `None` for channel layouts it does not know.
    pub fn to_rgb(&self) -> Option<Frame> {
        let data = match self.channels {
            3 => self.data.clone(),
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            2 => self
                .data
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0]])
                .collect(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            _ => return None,
        };
        Some(Frame::new(data, self.width, self.height, 3))
    }
}
