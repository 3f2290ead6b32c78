use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::domain::artifact_store::ArtifactKind;
use crate::capture::domain::capture_recorder::CaptureRecorder;
use crate::enrichment::domain::sample_batcher::{EnrichmentJob, SampleBatcher};
use crate::identity::domain::bounded_identity_store::BoundedIdentityStore;
use crate::ingest::domain::frame_cache::FrameCache;
use crate::ingest::domain::tracking_event::TrackingEvent;
use crate::ingest::infrastructure::frame_decoder;
use crate::recognition::domain::gallery_matcher::{FaceGalleryMatcher, MatchOutcome};
use crate::recognition::domain::track_registry::TrackRegistry;

/// What happened to one tracking event.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome {
    FrameMissing,
    FrameUndecodable,
    /// The body box lies outside the frame.
    EmptyCrop,
    Processed(CaptureReport),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureReport {
    pub body_dir: Option<PathBuf>,
    pub face: Option<MatchOutcome>,
    pub face_dir: Option<PathBuf>,
    /// Job to hand to the enrichment pool, if this sample completed a quota.
    pub enrichment: Option<EnrichmentJob>,
    /// Identities evicted while recording this event.
    pub evicted: Vec<u32>,
}

/// Per-event pipeline: fetch frame → crop body → store body → batch →
/// match face → store face. Each step that fails is logged and skips only
/// the steps that depend on it.
pub struct CaptureEventUseCase {
    frames: Arc<dyn FrameCache>,
    fetch_delay: Duration,
    matcher: FaceGalleryMatcher,
    recorder: Arc<CaptureRecorder>,
    identities: Arc<BoundedIdentityStore>,
    batcher: SampleBatcher,
    registry: Arc<TrackRegistry>,
}

impl CaptureEventUseCase {
    pub fn new(
        frames: Arc<dyn FrameCache>,
        fetch_delay: Duration,
        matcher: FaceGalleryMatcher,
        recorder: Arc<CaptureRecorder>,
        identities: Arc<BoundedIdentityStore>,
        batcher: SampleBatcher,
        registry: Arc<TrackRegistry>,
    ) -> Self {
        Self {
            frames,
            fetch_delay,
            matcher,
            recorder,
            identities,
            batcher,
            registry,
        }
    }

    pub fn execute(&self, event: &TrackingEvent) -> CaptureOutcome {
        let track_id = event.track_id;
        let key = event.frame_key();

        if !self.fetch_delay.is_zero() {
            std::thread::sleep(self.fetch_delay);
        }
        let Some(payload) = self.frames.get(&key) else {
            log::debug!("Track {track_id}: frame {key} not in cache");
            return CaptureOutcome::FrameMissing;
        };
        let frame = match frame_decoder::decode(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Track {track_id}: frame {key} undecodable: {e}");
                return CaptureOutcome::FrameUndecodable;
            }
        };
        let Some(body) = frame.crop(&event.bbox()) else {
            log::debug!("Track {track_id}: body box {:?} outside frame {key}", event.bbox());
            return CaptureOutcome::EmptyCrop;
        };

        let mut report = CaptureReport::default();

        report.body_dir = self.recorder.store(&body, track_id, ArtifactKind::Body);
        if let Some(dir) = &report.body_dir {
            if self.record_dir(track_id, ArtifactKind::Body, dir, &mut report.evicted) {
                let stored = self.recorder.artifacts(track_id, ArtifactKind::Body);
                report.enrichment = self.batcher.on_body_stored(track_id, stored);
            }
        }

        let outcome = self.matcher.evaluate(&body, track_id);
        match outcome {
            MatchOutcome::Matched(face_box) => match body.crop(&face_box) {
                Some(face) => {
                    report.face_dir = self.recorder.store(&face, track_id, ArtifactKind::Face);
                    if let Some(dir) = &report.face_dir {
                        self.record_dir(track_id, ArtifactKind::Face, dir, &mut report.evicted);
                    }
                }
                None => log::debug!("Track {track_id}: matched face box is empty"),
            },
            MatchOutcome::NotMatched(reason) => {
                log::debug!("Track {track_id}: face not captured: {reason}");
            }
        }
        report.face = Some(outcome);

        CaptureOutcome::Processed(report)
    }

    /// Returns whether the record write succeeded. Evicted ids are dropped
    /// from the registry either way.
    fn record_dir(
        &self,
        track_id: u32,
        kind: ArtifactKind,
        dir: &Path,
        evicted: &mut Vec<u32>,
    ) -> bool {
        let (ids, written) = match self.identities.record_artifact_dir(track_id, kind, dir) {
            Ok(ids) => (ids, true),
            Err(e) => {
                log::error!("Track {track_id}: failed to record {kind} directory: {e}");
                (e.evicted, false)
            }
        };
        for id in ids {
            self.registry.remove(id);
            evicted.push(id);
        }
        written
    }
}
