//! JPEG encode/decode between [`Frame`] and bytes using the `image` crate.
use std::io::Cursor;

use crate::shared::frame::Frame;

const JPEG_QUALITY: u8 = 90;

/// Encodes an RGB frame as JPEG.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let rgb = frame.to_rgb().ok_or("Unsupported pixel layout")?;
    let img = image::RgbImage::from_raw(rgb.width(), rgb.height(), rgb.data().to_vec())
        .ok_or("Failed to create image from frame data")?;

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    img.write_with_encoder(encoder)?;
    Ok(buf.into_inner())
}

/// Decodes any format the `image` crate recognizes into an RGB frame.
pub fn decode(bytes: &[u8]) -> Result<Frame, image::ImageError> {
    let img = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3))
}
