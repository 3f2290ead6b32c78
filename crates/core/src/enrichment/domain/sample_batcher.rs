use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::recognition::domain::track_registry::TrackRegistry;

/// When a track's body samples are sent for enrichment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentTrigger {
    /// Only when the counter first reaches the quota.
    Once,
    /// At every multiple of the quota.
    #[default]
    EveryQuota,
}

/// Work item for the enrichment pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichmentJob {
    pub track_id: u32,
    /// 1 for the first quota, 2 for the second, ...
    pub round: usize,
    /// Stored body crops to consolidate, in name order.
    pub samples: Vec<PathBuf>,
}

/// Counts accepted body captures per track and decides when to enrich.
pub struct SampleBatcher {
    registry: Arc<TrackRegistry>,
    quota: usize,
    trigger: EnrichmentTrigger,
}

impl SampleBatcher {
    pub fn new(registry: Arc<TrackRegistry>, quota: usize, trigger: EnrichmentTrigger) -> Self {
        Self {
            registry,
            quota: quota.max(1),
            trigger,
        }
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Counts one successful body store. Returns the trigger round when
    /// this sample completes a quota the policy fires on.
    pub fn record_sample(&self, track_id: u32) -> Option<usize> {
        let count = self.registry.with_track(track_id, |state| {
            state.accepted_samples += 1;
            state.accepted_samples
        });
        if count % self.quota != 0 {
            return None;
        }
        let round = count / self.quota;
        match self.trigger {
            EnrichmentTrigger::Once if round > 1 => None,
            _ => Some(round),
        }
    }

    /// Picks the crops for `round` from `stored`: the `round`-th window of
    /// `quota` files in name order, or the last `quota` when there are not
    /// enough files (some may have been removed).
    pub fn select(&self, mut stored: Vec<PathBuf>, round: usize) -> Vec<PathBuf> {
        stored.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        let start = round.saturating_sub(1) * self.quota;
        let end = start + self.quota;
        if end <= stored.len() {
            stored.drain(start..end).collect()
        } else {
            let from = stored.len().saturating_sub(self.quota);
            stored.split_off(from)
        }
    }

    /// Counts the sample and, on a trigger, builds the job from the
    /// currently stored crops.
    pub fn on_body_stored(&self, track_id: u32, stored: Vec<PathBuf>) -> Option<EnrichmentJob> {
        let round = self.record_sample(track_id)?;
        let samples = self.select(stored, round);
        log::info!(
            "Track {track_id}: sample quota reached (round {round}), {} crops selected",
            samples.len()
        );
        Some(EnrichmentJob {
            track_id,
            round,
            samples,
        })
    }
}
