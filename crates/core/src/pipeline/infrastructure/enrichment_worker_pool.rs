use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::enrichment::domain::sample_batcher::EnrichmentJob;
use crate::pipeline::enrich_identity_use_case::{EnrichIdentityUseCase, EnrichmentOutcome};
use crate::pipeline::ingest_executor::JobSink;

/// Totals reported when the pool shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub jobs: usize,
    pub described: usize,
}

/// Fixed set of threads draining a bounded queue of enrichment jobs.
///
/// Submission never blocks: when the queue is full the job is dropped and
/// logged, and the next quota for that track will enqueue a fresh one.
pub struct EnrichmentWorkerPool {
    sender: Sender<EnrichmentJob>,
    handles: Vec<JoinHandle<EnrichmentSummary>>,
}

impl EnrichmentWorkerPool {
    pub fn new(use_case: Arc<EnrichIdentityUseCase>, workers: usize, capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded::<EnrichmentJob>(capacity.max(1));
        let handles = (0..workers.max(1))
            .map(|_| spawn_worker(use_case.clone(), receiver.clone()))
            .collect();
        Self { sender, handles }
    }

    /// Handle that submits into this pool from any thread.
    pub fn queue(&self) -> EnrichmentQueue {
        EnrichmentQueue {
            sender: self.sender.clone(),
        }
    }

    /// Stops accepting jobs, waits for queued ones to finish and returns
    /// the totals. Queue handles still alive keep the workers running
    /// until they are dropped.
    pub fn shutdown(self) -> EnrichmentSummary {
        drop(self.sender);
        let mut total = EnrichmentSummary::default();
        for handle in self.handles {
            match handle.join() {
                Ok(summary) => {
                    total.jobs += summary.jobs;
                    total.described += summary.described;
                }
                Err(_) => log::error!("Enrichment worker panicked"),
            }
        }
        total
    }
}

fn spawn_worker(
    use_case: Arc<EnrichIdentityUseCase>,
    receiver: Receiver<EnrichmentJob>,
) -> JoinHandle<EnrichmentSummary> {
    std::thread::spawn(move || {
        let mut summary = EnrichmentSummary::default();
        for job in receiver {
            summary.jobs += 1;
            if let EnrichmentOutcome::Described(_) = use_case.execute(&job) {
                summary.described += 1;
            }
        }
        summary
    })
}

#[derive(Clone)]
pub struct EnrichmentQueue {
    sender: Sender<EnrichmentJob>,
}

impl JobSink for EnrichmentQueue {
    fn submit(&self, job: EnrichmentJob) -> bool {
        let track_id = job.track_id;
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Track {track_id}: enrichment queue full, job dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Track {track_id}: enrichment pool stopped, job dropped");
                false
            }
        }
    }
}
