use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory: {0}")]
    ModelDir(#[source] std::io::Error),
    #[error("configured model file does not exist: {0}")]
    MissingFile(PathBuf),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine model cache directory")]
    NoCacheDir,
}

/// Where a model file comes from when it is not configured explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSource {
    pub name: String,
    pub url: String,
}

impl ModelSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Locates a model file on disk, downloading it on first use.
///
/// An explicit path always wins and must exist. Otherwise the file is
/// looked up in `model_dir` (or the user cache directory) and fetched from
/// the source URL when absent.
pub fn resolve(
    source: &ModelSource,
    explicit: Option<&Path>,
    model_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::MissingFile(path.to_path_buf()))
        };
    }

    let dir = match model_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_model_dir()?,
    };
    let target = dir.join(&source.name);
    if target.exists() {
        return Ok(target);
    }

    fs::create_dir_all(&dir).map_err(ModelResolveError::ModelDir)?;
    log::info!("Downloading {} from {}", source.name, source.url);
    download(&source.url, &target)?;
    Ok(target)
}

/// `<cache_dir>/PersonCapture/models`.
pub fn default_model_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("PersonCapture").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let part = dest.with_extension("part");
    let result = fetch_to(url, &part).and_then(|()| {
        fs::rename(&part, dest).map_err(|e| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn fetch_to(url: &str, part: &Path) -> Result<(), ModelResolveError> {
    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: part.to_path_buf(),
        source: e,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let mut file = fs::File::create(part).map_err(write_err)?;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
    }
    file.flush().map_err(write_err)
}
