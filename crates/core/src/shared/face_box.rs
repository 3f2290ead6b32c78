use serde::{Deserialize, Serialize};

/// Axis-aligned pixel box in `[x1, y1, x2, y2)` form.
///
/// Used both for tracker body boxes and detected face boxes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl FaceBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Truncates float detector output to integer pixels.
    pub fn from_f64(bbox: [f64; 4]) -> Self {
        Self::new(
            bbox[0] as i32,
            bbox[1] as i32,
            bbox[2] as i32,
            bbox[3] as i32,
        )
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    /// Clamps to `[0, width) x [0, height)`; `None` if nothing remains.
    pub fn clamp(&self, width: u32, height: u32) -> Option<FaceBox> {
        let w = width as i32;
        let h = height as i32;
        let clamped = FaceBox::new(
            self.x1.clamp(0, w),
            self.y1.clamp(0, h),
            self.x2.clamp(0, w),
            self.y2.clamp(0, h),
        );
        if clamped.width() == 0 || clamped.height() == 0 {
            None
        } else {
            Some(clamped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_f64_truncates() {
        assert_eq!(
            FaceBox::from_f64([10.7, 10.2, 50.9, 50.0]),
            FaceBox::new(10, 10, 50, 50)
        );
    }

    #[rstest]
    #[case::inside(FaceBox::new(1, 1, 5, 5), Some(FaceBox::new(1, 1, 5, 5)))]
    #[case::overflow(FaceBox::new(-3, -3, 20, 20), Some(FaceBox::new(0, 0, 10, 10)))]
    #[case::outside(FaceBox::new(12, 12, 20, 20), None)]
    #[case::inverted(FaceBox::new(5, 5, 2, 2), None)]
    fn test_clamp(#[case] input: FaceBox, #[case] expected: Option<FaceBox>) {
        assert_eq!(input.clamp(10, 10), expected);
    }
}
