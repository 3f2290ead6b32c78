use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service response has no text: {0}")]
    MalformedResponse(String),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<DescribeError>,
    },
}

/// Black-box semantic description of an image.
pub trait DescriptionService: Send + Sync {
    /// Returns the service's raw text answer to `prompt` about `image`.
    fn describe(&self, prompt: &str, image: &Frame) -> Result<String, DescribeError>;
}
