use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::capture::infrastructure::jpeg;
use crate::enrichment::domain::description_service::{DescribeError, DescriptionService};
use crate::shared::frame::Frame;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Vision-language description via an Ollama-style `generate` endpoint.
///
/// One attempt per call; wrap in
/// [`RetryingDescriptionService`](super::retrying_description_service::RetryingDescriptionService)
/// for retries.
pub struct OllamaDescriptionService {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
}

impl OllamaDescriptionService {
    pub fn new(url: &str, model: &str, timeout: Duration) -> Result<Self, DescribeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DescribeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
            model: model.to_string(),
        })
    }
}

impl DescriptionService for OllamaDescriptionService {
    fn describe(&self, prompt: &str, image: &Frame) -> Result<String, DescribeError> {
        let bytes = jpeg::encode(image).map_err(|e| DescribeError::Encode(e.to_string()))?;
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            images: vec![base64::engine::general_purpose::STANDARD.encode(bytes)],
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| DescribeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DescribeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| DescribeError::MalformedResponse(e.to_string()))?;
        parsed
            .response
            .map(|text| text.trim().to_string())
            .ok_or_else(|| DescribeError::MalformedResponse("missing `response` field".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one HTTP request with a canned reply and returns the request body.
    fn one_shot_server(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/generate", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            String::from_utf8(request_body).unwrap()
        });
        (url, handle)
    }

    fn frame() -> Frame {
        Frame::new(vec![120; 4 * 4 * 3], 4, 4, 3)
    }

    #[test]
    fn test_sends_model_prompt_and_base64_image() {
        let (url, server) = one_shot_server("200 OK", r#"{"response": "  {\"gender\": \"male\"}  "}"#);
        let service = OllamaDescriptionService::new(&url, "llava", Duration::from_secs(5)).unwrap();

        let text = service.describe("describe", &frame()).unwrap();
        assert_eq!(text, r#"{"gender": "male"}"#);

        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent["model"], "llava");
        assert_eq!(sent["prompt"], "describe");
        assert_eq!(sent["stream"], false);
        let image = sent["images"][0].as_str().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(image).unwrap();
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_error_status_is_reported() {
        let (url, server) = one_shot_server("500 Internal Server Error", r#"{"error": "boom"}"#);
        let service = OllamaDescriptionService::new(&url, "llava", Duration::from_secs(5)).unwrap();
        let err = service.describe("p", &frame()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, DescribeError::Status { status: 500, .. }));
    }

    #[test]
    fn test_missing_response_field_is_malformed() {
        let (url, server) = one_shot_server("200 OK", r#"{"done": true}"#);
        let service = OllamaDescriptionService::new(&url, "llava", Duration::from_secs(5)).unwrap();
        let err = service.describe("p", &frame()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, DescribeError::MalformedResponse(_)));
    }

    #[test]
    fn test_unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/generate", listener.local_addr().unwrap());
        drop(listener);
        let service = OllamaDescriptionService::new(&url, "llava", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            service.describe("p", &frame()),
            Err(DescribeError::Transport(_))
        ));
    }
}
