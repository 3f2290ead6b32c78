use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrichment::domain::sample_batcher::EnrichmentTrigger;
use crate::recognition::domain::gallery_matcher::MatchThresholds;
use crate::recognition::infrastructure::{onnx_face_analyzer, onnx_pose_estimator};
use crate::shared::constants::{
    DEFAULT_CEILING, DESCRIBE_ATTEMPTS, DESCRIBE_TIMEOUT_SECS, SAMPLE_QUOTA,
};

const APP_DIR: &str = "PersonCapture";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    /// Ollama `generate` endpoint.
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub attempts: usize,
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".to_string(),
            model: "llava".to_string(),
            timeout_secs: DESCRIBE_TIMEOUT_SECS,
            attempts: DESCRIBE_ATTEMPTS,
        }
    }
}

/// Model file locations. Unset paths are resolved from `dir` (or the user
/// cache directory) and downloaded on first use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: Option<PathBuf>,
    pub face_detector: Option<PathBuf>,
    pub face_embedder: Option<PathBuf>,
    pub pose: Option<PathBuf>,
    pub face_confidence: f64,
    pub pose_confidence: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: None,
            face_detector: None,
            face_embedder: None,
            pose: None,
            face_confidence: onnx_face_analyzer::DEFAULT_CONFIDENCE,
            pose_confidence: onnx_pose_estimator::DEFAULT_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Root of the per-identity artifact directories.
    pub artifact_root: PathBuf,
    /// JSON file backing the identity records.
    pub record_store: PathBuf,
    pub ceiling: usize,
    pub sample_quota: usize,
    pub enrichment_trigger: EnrichmentTrigger,
    pub ingest_workers: usize,
    pub enrichment_workers: usize,
    pub enrichment_queue: usize,
    /// Wait before fetching a frame, for caches that lag the event bus.
    pub frame_fetch_delay_ms: u64,
    pub description: DescriptionConfig,
    pub models: ModelConfig,
    pub thresholds: MatchThresholds,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let data = data_dir();
        Self {
            artifact_root: data.join("captures"),
            record_store: data.join("identities.json"),
            ceiling: DEFAULT_CEILING,
            sample_quota: SAMPLE_QUOTA,
            enrichment_trigger: EnrichmentTrigger::default(),
            ingest_workers: 4,
            enrichment_workers: 2,
            enrichment_queue: 32,
            frame_fetch_delay_ms: 0,
            description: DescriptionConfig::default(),
            models: ModelConfig::default(),
            thresholds: MatchThresholds::default(),
        }
    }
}

impl CaptureConfig {
    /// `<config_dir>/PersonCapture/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
    }

    /// Loads `path`, or the default location when `None`. A missing file
    /// yields the defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config: Self =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ceiling == 0 {
            return Err(ConfigError::Invalid("ceiling must be at least 1".into()));
        }
        if self.sample_quota == 0 {
            return Err(ConfigError::Invalid("sample_quota must be at least 1".into()));
        }
        if self.description.attempts == 0 {
            return Err(ConfigError::Invalid(
                "description.attempts must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("models.face_confidence", self.models.face_confidence),
            ("models.pose_confidence", self.models.pose_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn frame_fetch_delay(&self) -> Duration {
        Duration::from_millis(self.frame_fetch_delay_ms)
    }

    pub fn describe_timeout(&self) -> Duration {
        Duration::from_secs(self.description.timeout_secs)
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}
