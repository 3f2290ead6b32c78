use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use capture_core::capture::domain::capture_recorder::CaptureRecorder;
use capture_core::capture::infrastructure::fs_artifact_store::FsArtifactStore;
use capture_core::config::CaptureConfig;
use capture_core::enrichment::domain::consolidator::EnrichmentConsolidator;
use capture_core::enrichment::domain::description_service::DescriptionService;
use capture_core::enrichment::domain::sample_batcher::SampleBatcher;
use capture_core::enrichment::infrastructure::ollama_description_service::OllamaDescriptionService;
use capture_core::enrichment::infrastructure::retrying_description_service::RetryingDescriptionService;
use capture_core::identity::domain::bounded_identity_store::BoundedIdentityStore;
use capture_core::identity::infrastructure::json_file_record_store::JsonFileRecordStore;
use capture_core::ingest::infrastructure::directory_frame_cache::DirectoryFrameCache;
use capture_core::ingest::infrastructure::json_lines_event_source::JsonLinesEventSource;
use capture_core::pipeline::capture_event_use_case::CaptureEventUseCase;
use capture_core::pipeline::enrich_identity_use_case::EnrichIdentityUseCase;
use capture_core::pipeline::infrastructure::enrichment_worker_pool::EnrichmentWorkerPool;
use capture_core::pipeline::infrastructure::threaded_ingest_executor::ThreadedIngestExecutor;
use capture_core::pipeline::ingest_executor::IngestExecutor;
use capture_core::recognition::domain::gallery_matcher::FaceGalleryMatcher;
use capture_core::recognition::domain::orientation_classifier::OrientationClassifier;
use capture_core::recognition::domain::track_registry::TrackRegistry;
use capture_core::recognition::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use capture_core::recognition::infrastructure::onnx_pose_estimator::OnnxPoseEstimator;
use capture_core::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
    POSE_MODEL_NAME, POSE_MODEL_URL,
};
use capture_core::shared::model_resolver::{self, ModelSource};

/// Identity-consistent person capture and enrichment.
#[derive(Parser)]
#[command(name = "capture-daemon")]
struct Cli {
    /// Config file (defaults to <config_dir>/PersonCapture/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consume tracking events and capture body/face crops per identity.
    Run(RunArgs),
    /// Print every stored identity with its captured images as JSON.
    List(ListArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON-lines tracking events (reads stdin when omitted).
    #[arg(long)]
    events: Option<PathBuf>,

    /// Directory holding frame payloads named by frame key.
    #[arg(long)]
    frames: PathBuf,

    /// Root directory for per-identity artifacts.
    #[arg(long)]
    artifact_root: Option<PathBuf>,

    /// JSON file backing the identity records.
    #[arg(long)]
    record_store: Option<PathBuf>,

    /// Maximum number of identities kept.
    #[arg(long)]
    ceiling: Option<usize>,

    /// Ingest worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Enrichment worker threads.
    #[arg(long)]
    enrichment_workers: Option<usize>,

    /// Ollama generate endpoint.
    #[arg(long)]
    ollama_url: Option<String>,

    /// Ollama vision model.
    #[arg(long)]
    ollama_model: Option<String>,

    /// Milliseconds to wait before fetching each frame.
    #[arg(long)]
    fetch_delay_ms: Option<u64>,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Root directory for per-identity artifacts.
    #[arg(long)]
    artifact_root: Option<PathBuf>,

    /// JSON file backing the identity records.
    #[arg(long)]
    record_store: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = CaptureConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => {
            apply_run_overrides(&mut config, &args);
            config.validate()?;
            run_capture(&config, &args)
        }
        Command::List(args) => {
            if let Some(root) = args.artifact_root {
                config.artifact_root = root;
            }
            if let Some(path) = args.record_store {
                config.record_store = path;
            }
            run_list(&config)
        }
    }
}

fn apply_run_overrides(config: &mut CaptureConfig, args: &RunArgs) {
    if let Some(root) = &args.artifact_root {
        config.artifact_root = root.clone();
    }
    if let Some(path) = &args.record_store {
        config.record_store = path.clone();
    }
    if let Some(ceiling) = args.ceiling {
        config.ceiling = ceiling;
    }
    if let Some(workers) = args.workers {
        config.ingest_workers = workers;
    }
    if let Some(workers) = args.enrichment_workers {
        config.enrichment_workers = workers;
    }
    if let Some(url) = &args.ollama_url {
        config.description.url = url.clone();
    }
    if let Some(model) = &args.ollama_model {
        config.description.model = model.clone();
    }
    if let Some(delay) = args.fetch_delay_ms {
        config.frame_fetch_delay_ms = delay;
    }
}

fn run_capture(config: &CaptureConfig, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.frames.is_dir() {
        return Err(format!("Frames directory not found: {}", args.frames.display()).into());
    }

    let registry = Arc::new(TrackRegistry::new());
    let recorder = Arc::new(CaptureRecorder::new(Arc::new(FsArtifactStore::new(
        &config.artifact_root,
    ))));
    let identities = Arc::new(BoundedIdentityStore::new(
        Arc::new(JsonFileRecordStore::open(&config.record_store)?),
        recorder.clone(),
        config.ceiling,
    ));

    let matcher = build_matcher(config, registry.clone())?;
    let capture = Arc::new(CaptureEventUseCase::new(
        Arc::new(DirectoryFrameCache::new(&args.frames)),
        config.frame_fetch_delay(),
        matcher,
        recorder.clone(),
        identities.clone(),
        SampleBatcher::new(
            registry.clone(),
            config.sample_quota,
            config.enrichment_trigger,
        ),
        registry.clone(),
    ));

    let enrich = Arc::new(EnrichIdentityUseCase::new(
        recorder,
        EnrichmentConsolidator::new(build_description_service(config)?),
        identities.clone(),
        registry,
    ));
    let pool = EnrichmentWorkerPool::new(enrich, config.enrichment_workers, config.enrichment_queue);

    let reader: Box<dyn BufRead> = match &args.events {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            format!("Cannot open events file {}: {e}", path.display())
        })?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let events = JsonLinesEventSource::new(reader);

    log::info!(
        "Capturing into {} (ceiling {}, {} ingest workers)",
        config.artifact_root.display(),
        config.ceiling,
        config.ingest_workers
    );
    let executor = ThreadedIngestExecutor::new(config.ingest_workers);
    let summary = executor.execute(Box::new(events), capture, Arc::new(pool.queue()));
    let enrichment = pool.shutdown();
    let summary = summary?;

    log::info!(
        "Done: {} events, {} missing frames, {} undecodable, {} empty crops",
        summary.events,
        summary.frames_missing,
        summary.frames_undecodable,
        summary.empty_crops
    );
    log::info!(
        "Stored {} bodies and {} faces, {} evictions, {} of {} enrichment jobs described",
        summary.bodies_stored,
        summary.faces_stored,
        summary.evictions,
        enrichment.described,
        enrichment.jobs
    );
    log::info!("{} identities on record", identities.population()?);
    Ok(())
}

fn run_list(config: &CaptureConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.record_store.exists() {
        log::info!("No records at {}", config.record_store.display());
    }
    let recorder = Arc::new(CaptureRecorder::new(Arc::new(FsArtifactStore::new(
        &config.artifact_root,
    ))));
    let identities = BoundedIdentityStore::new(
        Arc::new(JsonFileRecordStore::open(&config.record_store)?),
        recorder,
        config.ceiling,
    );
    let listing = identities.list_identities()?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn build_matcher(
    config: &CaptureConfig,
    registry: Arc<TrackRegistry>,
) -> Result<FaceGalleryMatcher, Box<dyn std::error::Error>> {
    let models = &config.models;
    let model_dir = models.dir.as_deref();

    let pose_path = resolve_model(
        &ModelSource::new(POSE_MODEL_NAME, POSE_MODEL_URL),
        models.pose.as_deref(),
        model_dir,
    )?;
    let detector_path = resolve_model(
        &ModelSource::new(FACE_MODEL_NAME, FACE_MODEL_URL),
        models.face_detector.as_deref(),
        model_dir,
    )?;
    let embedder_path = resolve_model(
        &ModelSource::new(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL),
        models.face_embedder.as_deref(),
        model_dir,
    )?;

    let estimator = OnnxPoseEstimator::new(&pose_path, models.pose_confidence)
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    let analyzer = OnnxFaceAnalyzer::new(&detector_path, &embedder_path, models.face_confidence)
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    let classifier = OrientationClassifier::new(Box::new(estimator));

    Ok(FaceGalleryMatcher::new(
        classifier,
        Box::new(analyzer),
        registry,
        config.thresholds,
    ))
}

fn resolve_model(
    source: &ModelSource,
    explicit: Option<&Path>,
    model_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", source.name);
    Ok(model_resolver::resolve(source, explicit, model_dir)?)
}

fn build_description_service(
    config: &CaptureConfig,
) -> Result<Arc<dyn DescriptionService>, Box<dyn std::error::Error>> {
    let desc = &config.description;
    let ollama = OllamaDescriptionService::new(&desc.url, &desc.model, config.describe_timeout())?;
    let retrying = RetryingDescriptionService::new(Box::new(ollama), desc.attempts)?;
    Ok(Arc::new(retrying))
}
