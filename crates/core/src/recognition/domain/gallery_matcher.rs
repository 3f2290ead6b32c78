//! Decides whether a detected face belongs to a track.
//!
//! Frontal faces are compared against the track's mean embedding with a
//! tight threshold and may extend the gallery. Profile faces use a looser
//! threshold and never extend it. The first face ever seen for a track is
//! trusted unconditionally and seeds the gallery.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::recognition::domain::face_analyzer::{DetectedFace, FaceAnalyzer};
use crate::recognition::domain::orientation::{Orientation, OrientationReading};
use crate::recognition::domain::orientation_classifier::OrientationClassifier;
use crate::recognition::domain::track_registry::{TrackRegistry, TrackState};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    /// Maximum cosine distance for a frontal face.
    pub frontal: f64,
    /// Maximum cosine distance for a profile face.
    pub profile: f64,
    /// Body-center drift under which a frontal face is accepted regardless
    /// of embedding distance.
    pub position: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            frontal: 0.5,
            profile: 0.6,
            position: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectReason {
    BackFacing,
    NoFace,
    UnknownOrientation,
    ProfileTooDistant { distance: f64 },
    FrontalTooDistant { distance: f64 },
    DetectionFailed,
    /// The track's gallery has no usable mean embedding.
    NoReference,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::BackFacing => write!(f, "subject faces away"),
            RejectReason::NoFace => write!(f, "no face detected"),
            RejectReason::UnknownOrientation => write!(f, "orientation unknown"),
            RejectReason::ProfileTooDistant { distance } => {
                write!(f, "profile face too distant ({distance:.3})")
            }
            RejectReason::FrontalTooDistant { distance } => {
                write!(f, "frontal face too distant ({distance:.3})")
            }
            RejectReason::DetectionFailed => write!(f, "face detection failed"),
            RejectReason::NoReference => write!(f, "gallery has no usable reference"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchOutcome {
    Matched(FaceBox),
    NotMatched(RejectReason),
}

impl MatchOutcome {
    pub fn face_box(&self) -> Option<FaceBox> {
        match self {
            MatchOutcome::Matched(b) => Some(*b),
            MatchOutcome::NotMatched(_) => None,
        }
    }
}

pub struct FaceGalleryMatcher {
    classifier: OrientationClassifier,
    analyzer: Box<dyn FaceAnalyzer>,
    registry: Arc<TrackRegistry>,
    thresholds: MatchThresholds,
}

impl FaceGalleryMatcher {
    pub fn new(
        classifier: OrientationClassifier,
        analyzer: Box<dyn FaceAnalyzer>,
        registry: Arc<TrackRegistry>,
        thresholds: MatchThresholds,
    ) -> Self {
        Self {
            classifier,
            analyzer,
            registry,
            thresholds,
        }
    }

    /// Evaluates one image of `track_id`.
    ///
    /// Model inference runs without holding the track lock; the gallery
    /// read and any append happen under it as one step.
    pub fn evaluate(&self, image: &Frame, track_id: u32) -> MatchOutcome {
        let reading = self.classifier.classify(image);
        if reading.orientation == Orientation::Back {
            return MatchOutcome::NotMatched(RejectReason::BackFacing);
        }

        let faces = match self.analyzer.analyze(image) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Track {track_id}: face analysis failed: {e}");
                return MatchOutcome::NotMatched(RejectReason::DetectionFailed);
            }
        };
        if faces.is_empty() {
            return MatchOutcome::NotMatched(RejectReason::NoFace);
        }

        let thresholds = self.thresholds;
        self.registry
            .with_track(track_id, |state| decide(state, &reading, faces, &thresholds))
    }
}

fn decide(
    state: &mut TrackState,
    reading: &OrientationReading,
    mut faces: Vec<DetectedFace>,
    thresholds: &MatchThresholds,
) -> MatchOutcome {
    if faces.is_empty() {
        return MatchOutcome::NotMatched(RejectReason::NoFace);
    }

    if state.gallery.is_empty() {
        let first = faces.swap_remove(0);
        state.gallery.push(first.embedding);
        if reading.body_center_x.is_some() {
            state.body_center_x = reading.body_center_x;
        }
        return MatchOutcome::Matched(first.bbox);
    }

    // Mixed embedding sizes leave the gallery without a usable mean.
    let Some(reference) = state.gallery.reference() else {
        return MatchOutcome::NotMatched(RejectReason::NoReference);
    };

    let closest = faces
        .into_iter()
        .map(|f| {
            let d = f.embedding.cosine_distance(&reference);
            (f, d)
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let Some((best, distance)) = closest else {
        return MatchOutcome::NotMatched(RejectReason::NoFace);
    };

    match reading.orientation {
        Orientation::Profile => {
            if distance <= thresholds.profile {
                MatchOutcome::Matched(best.bbox)
            } else {
                MatchOutcome::NotMatched(RejectReason::ProfileTooDistant { distance })
            }
        }
        Orientation::Frontal => {
            let positional = match (reading.body_center_x, state.body_center_x) {
                (Some(now), Some(prev)) => (now - prev).abs() < thresholds.position,
                _ => false,
            };
            if distance <= thresholds.frontal || positional {
                state.gallery.push(best.embedding);
                if reading.body_center_x.is_some() {
                    state.body_center_x = reading.body_center_x;
                }
                MatchOutcome::Matched(best.bbox)
            } else {
                MatchOutcome::NotMatched(RejectReason::FrontalTooDistant { distance })
            }
        }
        Orientation::Unknown | Orientation::Back => {
            MatchOutcome::NotMatched(RejectReason::UnknownOrientation)
        }
    }
}
