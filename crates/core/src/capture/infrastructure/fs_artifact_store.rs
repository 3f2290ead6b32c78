use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::capture::domain::artifact_store::{ArtifactError, ArtifactKind, ArtifactStore};
use crate::shared::constants::{ARTIFACT_EXTENSION, IDENTITY_DIR_PREFIX};
use crate::shared::frame::Frame;

use super::jpeg;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d__%H-%M-%S%.3f";

/// Give up finding a free name after this many suffixes.
const MAX_COLLISION_SUFFIX: u32 = 1000;

/// Stores artifacts as JPEG files under
/// `<root>/person_<id>/<kind>/<kind>_<id>_<timestamp>.jpg`.
///
/// Names that already exist get a `_<n>` suffix so concurrent captures in
/// the same millisecond never overwrite each other.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity_dir(&self, track_id: u32) -> PathBuf {
        self.root.join(format!("{IDENTITY_DIR_PREFIX}{track_id}"))
    }

    /// Creates the first free `<stem>[_n].jpg` in `dir` and fills it with
    /// `fill`. A file whose fill fails is removed again.
    fn create_unique(
        dir: &Path,
        stem: &str,
        fill: impl Fn(&mut File) -> io::Result<()>,
    ) -> Result<PathBuf, ArtifactError> {
        for n in 0..MAX_COLLISION_SUFFIX {
            let name = if n == 0 {
                format!("{stem}.{ARTIFACT_EXTENSION}")
            } else {
                format!("{stem}_{n}.{ARTIFACT_EXTENSION}")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = fill(&mut file) {
                        drop(file);
                        if let Err(rm) = std::fs::remove_file(&path) {
                            log::warn!(
                                "Failed to remove partial artifact {}: {rm}",
                                path.display()
                            );
                        }
                        return Err(e.into());
                    }
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(format!("No free artifact name for {stem} in {}", dir.display()).into())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(
        &self,
        frame: &Frame,
        track_id: u32,
        kind: ArtifactKind,
    ) -> Result<PathBuf, ArtifactError> {
        let dir = self.directory(track_id, kind);
        std::fs::create_dir_all(&dir)?;

        let bytes = jpeg::encode(frame)?;
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let stem = format!("{kind}_{track_id}_{timestamp}");
        Self::create_unique(&dir, &stem, |file| file.write_all(&bytes))
    }

    fn directory(&self, track_id: u32, kind: ArtifactKind) -> PathBuf {
        self.identity_dir(track_id).join(kind.as_str())
    }

    fn list(&self, track_id: u32, kind: ArtifactKind) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.directory(track_id, kind)) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
            })
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        paths
    }

    fn load(&self, path: &Path) -> Result<Frame, ArtifactError> {
        let bytes = std::fs::read(path)?;
        Ok(jpeg::decode(&bytes)?)
    }

    fn remove_identity(&self, track_id: u32) -> Result<(), ArtifactError> {
        match std::fs::remove_dir_all(self.identity_dir(track_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
