use std::sync::Arc;

use crate::enrichment::domain::description_service::DescriptionService;
use crate::enrichment::domain::prompts;
use crate::enrichment::domain::response_repair::repair;
use crate::identity::domain::description::ConsolidatedDescription;
use crate::shared::frame::Frame;

/// Folds several images of one person into a single description.
///
/// Samples are described in order. Until one response parses, samples get
/// the plain instruction prompt; afterwards each gets a refinement prompt
/// carrying the last good result. Failed calls and unparseable responses
/// skip the sample.
pub struct EnrichmentConsolidator {
    service: Arc<dyn DescriptionService>,
}

impl EnrichmentConsolidator {
    pub fn new(service: Arc<dyn DescriptionService>) -> Self {
        Self { service }
    }

    /// Returns `None` when no sample produced a usable description.
    pub fn consolidate(&self, samples: &[Frame], track_id: u32) -> Option<ConsolidatedDescription> {
        let mut current: Option<ConsolidatedDescription> = None;

        for (i, sample) in samples.iter().enumerate() {
            let prompt = match &current {
                None => prompts::instruction(),
                Some(previous) => prompts::refinement(previous),
            };

            let raw = match self.service.describe(&prompt, sample) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Track {track_id}: sample {i} not described: {e}");
                    continue;
                }
            };

            match repair(&raw).and_then(|v| ConsolidatedDescription::from_value(&v)) {
                Some(description) => current = Some(description),
                None => log::warn!(
                    "Track {track_id}: sample {i} response is not a JSON object, skipped"
                ),
            }
        }

        current
    }
}
