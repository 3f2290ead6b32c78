use std::sync::Arc;

use crate::capture::domain::capture_recorder::CaptureRecorder;
use crate::enrichment::domain::composite::compose;
use crate::enrichment::domain::consolidator::EnrichmentConsolidator;
use crate::enrichment::domain::sample_batcher::EnrichmentJob;
use crate::identity::domain::bounded_identity_store::BoundedIdentityStore;
use crate::identity::domain::description::ConsolidatedDescription;
use crate::recognition::domain::track_registry::TrackRegistry;

#[derive(Clone, Debug, PartialEq)]
pub enum EnrichmentOutcome {
    Described(ConsolidatedDescription),
    /// The identity was evicted before the job ran.
    IdentityGone,
    /// None of the selected crops could be read.
    NoSamples,
    /// No sample produced a usable description; the record is unchanged.
    Undescribed,
    /// The description could not be written.
    StoreFailed,
}

/// Runs one enrichment job: load crops → composite → consolidate → store.
///
/// The composite is described first, followed by each crop on its own.
pub struct EnrichIdentityUseCase {
    recorder: Arc<CaptureRecorder>,
    consolidator: EnrichmentConsolidator,
    identities: Arc<BoundedIdentityStore>,
    registry: Arc<TrackRegistry>,
}

impl EnrichIdentityUseCase {
    pub fn new(
        recorder: Arc<CaptureRecorder>,
        consolidator: EnrichmentConsolidator,
        identities: Arc<BoundedIdentityStore>,
        registry: Arc<TrackRegistry>,
    ) -> Self {
        Self {
            recorder,
            consolidator,
            identities,
            registry,
        }
    }

    pub fn execute(&self, job: &EnrichmentJob) -> EnrichmentOutcome {
        let track_id = job.track_id;
        match self.identities.get(track_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::info!("Track {track_id}: evicted before enrichment, job dropped");
                return EnrichmentOutcome::IdentityGone;
            }
            Err(e) => {
                log::error!("Track {track_id}: cannot read identity record: {e}");
                return EnrichmentOutcome::StoreFailed;
            }
        }

        let crops = self.recorder.load_all(&job.samples);
        let Some(composite) = compose(&crops) else {
            log::warn!("Track {track_id}: no readable crops for enrichment");
            return EnrichmentOutcome::NoSamples;
        };
        let mut samples = Vec::with_capacity(crops.len() + 1);
        samples.push(composite);
        samples.extend(crops);

        let Some(description) = self.consolidator.consolidate(&samples, track_id) else {
            log::warn!("Track {track_id}: enrichment produced no description");
            return EnrichmentOutcome::Undescribed;
        };

        match self.identities.record_description(track_id, &description) {
            Ok(evicted) => {
                for id in evicted {
                    self.registry.remove(id);
                }
                log::info!("Track {track_id}: description updated (round {})", job.round);
                EnrichmentOutcome::Described(description)
            }
            Err(e) => {
                log::error!("Track {track_id}: failed to store description: {e}");
                for id in e.evicted {
                    self.registry.remove(id);
                }
                EnrichmentOutcome::StoreFailed
            }
        }
    }
}
