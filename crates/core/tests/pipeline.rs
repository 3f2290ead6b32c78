use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use capture_core::capture::domain::capture_recorder::CaptureRecorder;
use capture_core::capture::infrastructure::fs_artifact_store::FsArtifactStore;
use capture_core::capture::infrastructure::jpeg;
use capture_core::enrichment::domain::consolidator::EnrichmentConsolidator;
use capture_core::enrichment::domain::description_service::{DescribeError, DescriptionService};
use capture_core::enrichment::domain::sample_batcher::{EnrichmentTrigger, SampleBatcher};
use capture_core::enrichment::infrastructure::retrying_description_service::RetryingDescriptionService;
use capture_core::identity::domain::bounded_identity_store::BoundedIdentityStore;
use capture_core::identity::domain::description::{AgeBracket, Gender, HeadAccessory};
use capture_core::identity::infrastructure::json_file_record_store::JsonFileRecordStore;
use capture_core::ingest::domain::tracking_event::TrackingEvent;
use capture_core::ingest::infrastructure::in_memory_frame_cache::InMemoryFrameCache;
use capture_core::pipeline::capture_event_use_case::CaptureEventUseCase;
use capture_core::pipeline::enrich_identity_use_case::EnrichIdentityUseCase;
use capture_core::pipeline::infrastructure::enrichment_worker_pool::{
    EnrichmentSummary, EnrichmentWorkerPool,
};
use capture_core::pipeline::infrastructure::threaded_ingest_executor::ThreadedIngestExecutor;
use capture_core::pipeline::ingest_executor::{IngestExecutor, RunSummary};
use capture_core::recognition::domain::embedding::Embedding;
use capture_core::recognition::domain::face_analyzer::{DetectedFace, FaceAnalyzer, ModelError};
use capture_core::recognition::domain::gallery_matcher::{FaceGalleryMatcher, MatchThresholds};
use capture_core::recognition::domain::orientation::{Landmark, PoseLandmarks};
use capture_core::recognition::domain::orientation_classifier::OrientationClassifier;
use capture_core::recognition::domain::pose_estimator::PoseEstimator;
use capture_core::recognition::domain::track_registry::TrackRegistry;
use capture_core::shared::face_box::FaceBox;
use capture_core::shared::frame::Frame;

// --- Stubs ---

struct FrontalPose;

impl PoseEstimator for FrontalPose {
    fn estimate(&self, _frame: &Frame) -> Result<Option<PoseLandmarks>, ModelError> {
        Ok(Some(PoseLandmarks {
            nose: Landmark::new(0.5, 0.2, 0.9),
            left_shoulder: Landmark::new(0.6, 0.4, 0.9),
            right_shoulder: Landmark::new(0.4, 0.4, 0.9),
        }))
    }
}

/// Same face, same embedding, every time.
struct SteadyFace;

impl FaceAnalyzer for SteadyFace {
    fn analyze(&self, _frame: &Frame) -> Result<Vec<DetectedFace>, ModelError> {
        Ok(vec![DetectedFace {
            bbox: FaceBox::new(1, 1, 5, 5),
            embedding: Embedding::normalized(vec![0.0, 1.0, 0.0]),
        }])
    }
}

/// Replies from a script in call order; past its end, keeps failing.
struct ScriptedService {
    replies: Mutex<Vec<Result<&'static str, ()>>>,
}

impl ScriptedService {
    fn new(mut replies: Vec<Result<&'static str, ()>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }
}

impl DescriptionService for ScriptedService {
    fn describe(&self, _prompt: &str, _image: &Frame) -> Result<String, DescribeError> {
        match self.replies.lock().unwrap().pop() {
            Some(Ok(text)) => Ok(text.to_string()),
            _ => Err(DescribeError::Transport("connection refused".into())),
        }
    }
}

struct DownService {
    calls: Arc<AtomicUsize>,
}

impl DescriptionService for DownService {
    fn describe(&self, _prompt: &str, _image: &Frame) -> Result<String, DescribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DescribeError::Status {
            status: 503,
            body: "loading model".into(),
        })
    }
}

// --- Harness ---

struct Harness {
    tmp: TempDir,
    frames: Arc<InMemoryFrameCache>,
    registry: Arc<TrackRegistry>,
    identities: Arc<BoundedIdentityStore>,
    capture: Arc<CaptureEventUseCase>,
    enrich: Arc<EnrichIdentityUseCase>,
}

impl Harness {
    fn new(ceiling: usize, service: Arc<dyn DescriptionService>) -> Self {
        let tmp = TempDir::new().unwrap();
        let frames = Arc::new(InMemoryFrameCache::new());
        let registry = Arc::new(TrackRegistry::new());
        let recorder = Arc::new(CaptureRecorder::new(Arc::new(FsArtifactStore::new(
            tmp.path().join("captures"),
        ))));
        let records = JsonFileRecordStore::open(tmp.path().join("identities.json")).unwrap();
        let identities = Arc::new(BoundedIdentityStore::new(
            Arc::new(records),
            recorder.clone(),
            ceiling,
        ));

        let matcher = FaceGalleryMatcher::new(
            OrientationClassifier::new(Box::new(FrontalPose)),
            Box::new(SteadyFace),
            registry.clone(),
            MatchThresholds::default(),
        );
        let capture = Arc::new(CaptureEventUseCase::new(
            frames.clone(),
            Duration::ZERO,
            matcher,
            recorder.clone(),
            identities.clone(),
            SampleBatcher::new(registry.clone(), 4, EnrichmentTrigger::EveryQuota),
            registry.clone(),
        ));
        let enrich = Arc::new(EnrichIdentityUseCase::new(
            recorder,
            EnrichmentConsolidator::new(service),
            identities.clone(),
            registry.clone(),
        ));

        Self {
            tmp,
            frames,
            registry,
            identities,
            capture,
            enrich,
        }
    }

    fn publish(&self, frame_num: u64) {
        let frame = Frame::new(vec![90; 24 * 32 * 3], 24, 32, 3);
        self.frames
            .insert(format!("cam0_{frame_num}"), jpeg::encode(&frame).unwrap());
    }

    /// Ingests `events`, then drains the enrichment pool.
    fn run(&self, workers: usize, events: Vec<TrackingEvent>) -> (RunSummary, EnrichmentSummary) {
        let pool = EnrichmentWorkerPool::new(self.enrich.clone(), 1, 8);
        let summary = ThreadedIngestExecutor::new(workers)
            .execute(
                Box::new(events.into_iter()),
                self.capture.clone(),
                Arc::new(pool.queue()),
            )
            .unwrap();
        (summary, pool.shutdown())
    }
}

fn event(track_id: u32, frame_num: u64) -> TrackingEvent {
    TrackingEvent {
        camera_id: "cam0".into(),
        frame_num,
        track_id,
        bbox_left: 2.0,
        bbox_top: 2.0,
        bbox_width: 12.0,
        bbox_height: 20.0,
    }
}

#[test]
fn test_ceiling_evicts_oldest_identity_and_its_artifacts() {
    let h = Harness::new(2, Arc::new(ScriptedService::new(Vec::new())));
    for n in 1..=3 {
        h.publish(n);
    }
    let captures = h.tmp.path().join("captures");

    let (summary, _) = h.run(1, vec![event(1, 1), event(2, 2), event(3, 3)]);

    assert_eq!(summary.events, 3);
    assert_eq!(summary.bodies_stored, 3);
    assert_eq!(summary.faces_stored, 3);
    assert_eq!(summary.evictions, 1);

    let ids: Vec<u32> = h
        .identities
        .list_identities()
        .unwrap()
        .into_iter()
        .map(|l| l.record.id)
        .collect();
    assert_eq!(ids, vec![2, 3]);
    assert!(!captures.join("person_1").exists());
    assert!(captures.join("person_2").join("body").is_dir());
    assert!(captures.join("person_3").join("face").is_dir());
    assert!(h.registry.snapshot(1).is_none());
}

#[test]
fn test_quota_enriches_with_last_valid_description() {
    // Composite first, then the four crops; the final crop's reply is junk.
    let service = ScriptedService::new(vec![
        Ok(r#"{"gender": "Male", "age": "adult", "upper_clothing": "grey hoodie"}"#),
        Ok("```json\n{\"gender\": \"male\", \"age\": \"young adult\", \"upper_clothing\": \"grey hoodie\", \"head_accessory\": \"cap\"}\n```"),
        Err(()),
        Ok(r#"{"gender": "male", "age": "young_adult", "upper_clothing": "grey hoodie", "lower_clothing": "black jeans", "head_accessory": "Cap"}"#),
        Ok("I cannot tell from this image."),
    ]);
    let h = Harness::new(20, Arc::new(service));
    for n in 1..=4 {
        h.publish(n);
    }

    let events = (1..=4).map(|n| event(7, n)).collect();
    let (summary, enrichment) = h.run(2, events);

    assert_eq!(summary.bodies_stored, 4);
    assert_eq!(summary.enrichments_queued, 1);
    assert_eq!(enrichment, EnrichmentSummary { jobs: 1, described: 1 });

    let desc = h.identities.description(7).unwrap().unwrap();
    assert_eq!(desc.gender, Gender::Male);
    assert_eq!(desc.age, AgeBracket::YoungAdult);
    assert_eq!(desc.upper_clothing, "grey hoodie");
    assert_eq!(desc.lower_clothing, "black jeans");
    assert_eq!(desc.head_accessory, HeadAccessory::Cap);

    let listing = h.identities.list_identities().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].body_images.len(), 4);
    assert_eq!(listing[0].face_images.len(), 4);

    // Records survive a reopen of the backing file.
    let reopened = JsonFileRecordStore::open(h.tmp.path().join("identities.json")).unwrap();
    let recorder = Arc::new(CaptureRecorder::new(Arc::new(FsArtifactStore::new(
        h.tmp.path().join("captures"),
    ))));
    let again = BoundedIdentityStore::new(Arc::new(reopened), recorder, 20);
    assert_eq!(again.description(7).unwrap(), Some(desc));
}

#[test]
fn test_service_down_leaves_identity_undescribed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let retrying = RetryingDescriptionService::new(
        Box::new(DownService {
            calls: calls.clone(),
        }),
        2,
    )
    .unwrap();
    let h = Harness::new(20, Arc::new(retrying));
    for n in 1..=4 {
        h.publish(n);
    }

    let events = (1..=4).map(|n| event(9, n)).collect();
    let (summary, enrichment) = h.run(1, events);

    assert_eq!(summary.enrichments_queued, 1);
    assert_eq!(enrichment, EnrichmentSummary { jobs: 1, described: 0 });
    // Composite plus four crops, two attempts each.
    assert_eq!(calls.load(Ordering::SeqCst), 10);

    let record = h.identities.get(9).unwrap().unwrap();
    assert!(record.description.is_none());
    assert!(record.body_dir.is_some());
}
