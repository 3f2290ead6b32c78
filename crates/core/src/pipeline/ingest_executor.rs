use std::sync::Arc;

use crate::enrichment::domain::sample_batcher::EnrichmentJob;
use crate::ingest::domain::tracking_event::TrackingEvent;
use crate::pipeline::capture_event_use_case::{CaptureEventUseCase, CaptureOutcome};

/// Counters for one ingest run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events: usize,
    pub frames_missing: usize,
    pub frames_undecodable: usize,
    pub empty_crops: usize,
    pub bodies_stored: usize,
    pub faces_stored: usize,
    pub enrichments_queued: usize,
    pub evictions: usize,
}

impl RunSummary {
    /// Folds one event outcome in. `queued` says whether its enrichment job
    /// (if any) was accepted by the pool.
    pub fn add(&mut self, outcome: &CaptureOutcome, queued: bool) {
        self.events += 1;
        match outcome {
            CaptureOutcome::FrameMissing => self.frames_missing += 1,
            CaptureOutcome::FrameUndecodable => self.frames_undecodable += 1,
            CaptureOutcome::EmptyCrop => self.empty_crops += 1,
            CaptureOutcome::Processed(report) => {
                self.bodies_stored += usize::from(report.body_dir.is_some());
                self.faces_stored += usize::from(report.face_dir.is_some());
                self.enrichments_queued += usize::from(queued);
                self.evictions += report.evicted.len();
            }
        }
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.events += other.events;
        self.frames_missing += other.frames_missing;
        self.frames_undecodable += other.frames_undecodable;
        self.empty_crops += other.empty_crops;
        self.bodies_stored += other.bodies_stored;
        self.faces_stored += other.faces_stored;
        self.enrichments_queued += other.enrichments_queued;
        self.evictions += other.evictions;
    }
}

/// Destination for enrichment jobs produced during ingest.
pub trait JobSink: Send + Sync {
    /// Returns `false` when the job was dropped.
    fn submit(&self, job: EnrichmentJob) -> bool;
}

/// Abstracts how a stream of tracking events is driven through the
/// capture use case.
pub trait IngestExecutor {
    fn execute(
        &self,
        events: Box<dyn Iterator<Item = TrackingEvent> + '_>,
        use_case: Arc<CaptureEventUseCase>,
        jobs: Arc<dyn JobSink>,
    ) -> Result<RunSummary, Box<dyn std::error::Error>>;
}
