//! Coarse body orientation from three pose landmarks.
//!
//! Shoulders decide whether the pose is usable at all; the nose decides
//! between back-facing, profile and frontal.

/// Shoulder visibility below this makes the pose unusable.
pub const SHOULDER_VISIBILITY_MIN: f64 = 0.5;

/// Nose visibility below this means the subject faces away.
pub const NOSE_VISIBILITY_BACK: f64 = 0.2;

/// Nose-to-shoulder-midpoint offset (fraction of image width) beyond which
/// the head is in profile.
pub const PROFILE_OFFSET: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Frontal,
    Profile,
    Back,
    Unknown,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Frontal => write!(f, "frontal"),
            Orientation::Profile => write!(f, "profile"),
            Orientation::Back => write!(f, "back"),
            Orientation::Unknown => write!(f, "unknown"),
        }
    }
}

/// One pose keypoint in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseLandmarks {
    pub nose: Landmark,
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
}

/// Result of classifying one image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientationReading {
    pub orientation: Orientation,
    /// Shoulder midpoint x in `[0, 1]`, absent when the pose is unusable.
    pub body_center_x: Option<f64>,
}

impl OrientationReading {
    pub fn unknown() -> Self {
        Self {
            orientation: Orientation::Unknown,
            body_center_x: None,
        }
    }
}

pub fn classify(landmarks: Option<&PoseLandmarks>) -> OrientationReading {
    let Some(lm) = landmarks else {
        return OrientationReading::unknown();
    };

    if lm.left_shoulder.visibility < SHOULDER_VISIBILITY_MIN
        || lm.right_shoulder.visibility < SHOULDER_VISIBILITY_MIN
    {
        return OrientationReading::unknown();
    }

    let center_x = (lm.left_shoulder.x + lm.right_shoulder.x) / 2.0;
    let orientation = if lm.nose.visibility < NOSE_VISIBILITY_BACK {
        Orientation::Back
    } else if (lm.nose.x - center_x).abs() > PROFILE_OFFSET {
        Orientation::Profile
    } else {
        Orientation::Frontal
    };

    OrientationReading {
        orientation,
        body_center_x: Some(center_x),
    }
}
