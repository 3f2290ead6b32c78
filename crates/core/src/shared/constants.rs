pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const POSE_MODEL_NAME: &str = "yolo11n-pose.onnx";
pub const POSE_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolo11n-pose.onnx";

/// Maximum embeddings kept per track gallery.
pub const GALLERY_CAPACITY: usize = 5;

/// Default population ceiling of the identity store.
pub const DEFAULT_CEILING: usize = 20;

/// Accepted body captures that trigger one enrichment pass.
pub const SAMPLE_QUOTA: usize = 4;

/// Maximum attempts per description-service call.
pub const DESCRIBE_ATTEMPTS: usize = 2;

/// Per-attempt timeout for the description service, in seconds.
pub const DESCRIBE_TIMEOUT_SECS: u64 = 30;

/// Clothing descriptions are capped at this many characters.
pub const CLOTHING_MAX_CHARS: usize = 25;

/// Directory prefix for per-identity artifact folders.
pub const IDENTITY_DIR_PREFIX: &str = "person_";

pub const ARTIFACT_EXTENSION: &str = "jpg";
