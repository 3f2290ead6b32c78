use base64::Engine as _;
use thiserror::Error;

use crate::capture::infrastructure::jpeg;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum FrameDecodeError {
    #[error("frame payload is empty")]
    Empty,
    #[error("frame payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decodes a cached frame payload.
///
/// Publishers store either base64 text or raw image bytes; base64 is tried
/// first and the raw bytes are the fallback.
pub fn decode(payload: &[u8]) -> Result<Frame, FrameDecodeError> {
    if payload.is_empty() {
        return Err(FrameDecodeError::Empty);
    }
    if let Some(frame) = decode_base64(payload) {
        return Ok(frame);
    }
    Ok(jpeg::decode(payload)?)
}

fn decode_base64(payload: &[u8]) -> Option<Frame> {
    let text: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(text).ok()?;
    match jpeg::decode(&bytes) {
        Ok(frame) => Some(frame),
        Err(e) => {
            log::debug!("Base64 payload is not an image, trying raw bytes: {e}");
            None
        }
    }
}
