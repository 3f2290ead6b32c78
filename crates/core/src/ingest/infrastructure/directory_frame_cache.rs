use std::path::PathBuf;

use crate::ingest::domain::frame_cache::FrameCache;

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "b64"];

/// Frame cache backed by a directory of files named after the frame key,
/// either bare (`<key>`) or with an image extension (`<key>.jpg`).
pub struct DirectoryFrameCache {
    dir: PathBuf,
}

impl DirectoryFrameCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, key: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let key = key.to_string();
        std::iter::once(self.dir.join(&key)).chain(
            FRAME_EXTENSIONS
                .into_iter()
                .map(move |ext| self.dir.join(format!("{key}.{ext}"))),
        )
    }
}

impl FrameCache for DirectoryFrameCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        // Keys are used as file names; refuse anything that could escape the directory.
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            log::warn!("Rejected frame key {key:?}");
            return None;
        }
        self.candidates(key)
            .find(|path| path.is_file())
            .and_then(|path| match std::fs::read(&path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("Cannot read frame {}: {e}", path.display());
                    None
                }
            })
    }
}
