use crate::enrichment::domain::description_service::{DescribeError, DescriptionService};
use crate::shared::frame::Frame;

/// Decorator that retries a failing description call immediately, up to a
/// fixed number of attempts in total.
pub struct RetryingDescriptionService {
    inner: Box<dyn DescriptionService>,
    attempts: usize,
}

impl RetryingDescriptionService {
    pub fn new(inner: Box<dyn DescriptionService>, attempts: usize) -> Result<Self, &'static str> {
        if attempts < 1 {
            return Err("attempts must be >= 1");
        }
        Ok(Self { inner, attempts })
    }
}

impl DescriptionService for RetryingDescriptionService {
    fn describe(&self, prompt: &str, image: &Frame) -> Result<String, DescribeError> {
        let mut attempt = 1;
        loop {
            match self.inner.describe(prompt, image) {
                Ok(text) => return Ok(text),
                Err(e) if attempt >= self.attempts => {
                    return Err(DescribeError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    log::warn!("Description attempt {attempt}/{} failed: {e}", self.attempts);
                    attempt += 1;
                }
            }
        }
    }
}
