/// Keyed store of recently published frames.
///
/// A miss is normal: frames expire, and the cache can lag the event bus.
pub trait FrameCache: Send + Sync {
    /// Raw payload for `key`: encoded image bytes, possibly base64 text.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
}
