use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::capture::domain::artifact_store::{ArtifactKind, ArtifactStore};
use crate::shared::frame::Frame;

/// Stores accepted crops and hands back the directory they landed in.
///
/// Failures never propagate: they are logged and reported as `None` so
/// the caller can skip whatever depended on the write.
pub struct CaptureRecorder {
    store: Arc<dyn ArtifactStore>,
}

impl CaptureRecorder {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    pub fn store(&self, frame: &Frame, track_id: u32, kind: ArtifactKind) -> Option<PathBuf> {
        if frame.is_empty() {
            log::warn!("Track {track_id}: empty {kind} crop not stored");
            return None;
        }
        let Some(rgb) = frame.to_rgb() else {
            log::warn!(
                "Track {track_id}: {kind} crop has unsupported {} channels",
                frame.channels()
            );
            return None;
        };

        match self.store.write(&rgb, track_id, kind) {
            Ok(path) => {
                log::debug!("Track {track_id}: stored {kind} crop at {}", path.display());
                path.parent().map(Path::to_path_buf)
            }
            Err(e) => {
                log::error!("Track {track_id}: failed to store {kind} crop: {e}");
                None
            }
        }
    }

    pub fn artifacts(&self, track_id: u32, kind: ArtifactKind) -> Vec<PathBuf> {
        self.store.list(track_id, kind)
    }

    pub fn directory(&self, track_id: u32, kind: ArtifactKind) -> PathBuf {
        self.store.directory(track_id, kind)
    }

    /// Decodes stored crops, skipping (and logging) unreadable ones.
    pub fn load_all(&self, paths: &[PathBuf]) -> Vec<Frame> {
        paths
            .iter()
            .filter_map(|path| match self.store.load(path) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    log::warn!("Cannot read artifact {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Best-effort removal of every artifact of an identity.
    pub fn purge(&self, track_id: u32) -> bool {
        match self.store.remove_identity(track_id) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Track {track_id}: failed to delete artifacts: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::artifact_store::ArtifactError;
    use std::sync::Mutex;

    // --- Stubs ---

    #[derive(Default)]
    struct RecordingStore {
        written: Mutex<Vec<(u32, ArtifactKind, u8)>>,
        fail: bool,
    }

    impl ArtifactStore for RecordingStore {
        fn write(
            &self,
            frame: &Frame,
            track_id: u32,
            kind: ArtifactKind,
        ) -> Result<PathBuf, ArtifactError> {
            if self.fail {
                return Err("disk full".into());
            }
            self.written
                .lock()
                .unwrap()
                .push((track_id, kind, frame.channels()));
            Ok(self.directory(track_id, kind).join("crop.jpg"))
        }

        fn directory(&self, track_id: u32, kind: ArtifactKind) -> PathBuf {
            PathBuf::from(format!("/store/person_{track_id}/{kind}"))
        }

        fn list(&self, _track_id: u32, _kind: ArtifactKind) -> Vec<PathBuf> {
            Vec::new()
        }

        fn load(&self, path: &Path) -> Result<Frame, ArtifactError> {
            if path.ends_with("bad.jpg") {
                return Err("corrupt".into());
            }
            Ok(Frame::new(vec![0; 3], 1, 1, 3))
        }

        fn remove_identity(&self, _track_id: u32) -> Result<(), ArtifactError> {
            if self.fail {
                return Err("busy".into());
            }
            Ok(())
        }
    }

    fn recorder(fail: bool) -> (CaptureRecorder, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore {
            fail,
            ..Default::default()
        });
        (CaptureRecorder::new(store.clone()), store)
    }

    #[test]
    fn test_store_returns_parent_directory() {
        let (recorder, _) = recorder(false);
        let frame = Frame::new(vec![1; 12], 2, 2, 3);
        let dir = recorder.store(&frame, 4, ArtifactKind::Body).unwrap();
        assert_eq!(dir, PathBuf::from("/store/person_4/body"));
    }

    #[test]
    fn test_store_converts_to_rgb() {
        let (recorder, store) = recorder(false);
        let gray = Frame::new(vec![7; 4], 2, 2, 1);
        recorder.store(&gray, 1, ArtifactKind::Face).unwrap();
        assert_eq!(store.written.lock().unwrap()[0], (1, ArtifactKind::Face, 3));
    }

    #[test]
    fn test_store_rejects_empty_frame() {
        let (recorder, store) = recorder(false);
        let empty = Frame::new(Vec::new(), 0, 0, 3);
        assert!(recorder.store(&empty, 1, ArtifactKind::Body).is_none());
        assert!(store.written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_store_failure_is_none() {
        let (recorder, _) = recorder(true);
        let frame = Frame::new(vec![1; 3], 1, 1, 3);
        assert!(recorder.store(&frame, 1, ArtifactKind::Body).is_none());
    }

    #[test]
    fn test_load_all_skips_unreadable() {
        let (recorder, _) = recorder(false);
        let frames = recorder.load_all(&[
            PathBuf::from("/a/good.jpg"),
            PathBuf::from("/a/bad.jpg"),
            PathBuf::from("/a/good2.jpg"),
        ]);
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_purge_reports_failure() {
        assert!(recorder(false).0.purge(3));
        assert!(!recorder(true).0.purge(3));
    }
}
