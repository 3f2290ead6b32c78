use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::ingest::domain::tracking_event::TrackingEvent;
use crate::pipeline::capture_event_use_case::{CaptureEventUseCase, CaptureOutcome};
use crate::pipeline::ingest_executor::{IngestExecutor, JobSink, RunSummary};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Runs the capture use case on a fixed pool of worker threads.
///
/// Layout: `caller thread [events] → bounded queue → N workers`
///
/// Workers share nothing but the use case; per-track serialization is the
/// track registry's job. Each worker keeps its own summary, merged at the end.
pub struct ThreadedIngestExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedIngestExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ThreadedIngestExecutor {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}

impl IngestExecutor for ThreadedIngestExecutor {
    fn execute(
        &self,
        events: Box<dyn Iterator<Item = TrackingEvent> + '_>,
        use_case: Arc<CaptureEventUseCase>,
        jobs: Arc<dyn JobSink>,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let (event_tx, event_rx) = crossbeam_channel::bounded::<TrackingEvent>(self.channel_capacity);

        let handles: Vec<JoinHandle<RunSummary>> = (0..self.workers)
            .map(|_| spawn_worker(use_case.clone(), jobs.clone(), event_rx.clone()))
            .collect();
        drop(event_rx);

        let mut dispatched = 0usize;
        for event in events {
            if event_tx.send(event).is_err() {
                break;
            }
            dispatched += 1;
        }
        drop(event_tx);

        let mut total = RunSummary::default();
        let mut panicked = 0usize;
        for handle in handles {
            match handle.join() {
                Ok(summary) => total.merge(&summary),
                Err(_) => panicked += 1,
            }
        }
        if panicked > 0 {
            return Err(format!("{panicked} ingest worker(s) panicked").into());
        }

        log::info!(
            "Ingest finished: {dispatched} events, {} bodies, {} faces, {} enrichments queued",
            total.bodies_stored,
            total.faces_stored,
            total.enrichments_queued
        );
        Ok(total)
    }
}

fn spawn_worker(
    use_case: Arc<CaptureEventUseCase>,
    jobs: Arc<dyn JobSink>,
    event_rx: Receiver<TrackingEvent>,
) -> JoinHandle<RunSummary> {
    std::thread::spawn(move || {
        let mut summary = RunSummary::default();
        for event in event_rx {
            let mut outcome = use_case.execute(&event);
            let queued = match &mut outcome {
                CaptureOutcome::Processed(report) => report
                    .enrichment
                    .take()
                    .is_some_and(|job| jobs.submit(job)),
                _ => false,
            };
            summary.add(&outcome, queued);
        }
        summary
    })
}
