use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;

pub type ArtifactError = Box<dyn std::error::Error + Send + Sync>;

/// Which crop of a person an artifact holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Body,
    Face,
}

impl ArtifactKind {
    /// Directory and file-name component for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Body => "body",
            ArtifactKind::Face => "face",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent storage of per-identity image crops.
///
/// Artifacts are grouped per identity and per kind; names sort in
/// capture order.
pub trait ArtifactStore: Send + Sync {
    /// Writes an RGB frame and returns the path of the new file.
    fn write(
        &self,
        frame: &Frame,
        track_id: u32,
        kind: ArtifactKind,
    ) -> Result<PathBuf, ArtifactError>;

    /// Directory that holds artifacts of `kind` for `track_id`.
    fn directory(&self, track_id: u32, kind: ArtifactKind) -> PathBuf;

    /// Stored artifact files of one kind, sorted by file name.
    fn list(&self, track_id: u32, kind: ArtifactKind) -> Vec<PathBuf>;

    /// Decodes a stored artifact.
    fn load(&self, path: &Path) -> Result<Frame, ArtifactError>;

    /// Deletes every artifact of an identity. Absent identities are not an error.
    fn remove_identity(&self, track_id: u32) -> Result<(), ArtifactError>;
}
