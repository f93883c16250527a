use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::analyzer::{AnalysisPrompt, AnalyzerError, VisionAnalyzer};

pub const BOUNDARY: &str = "----fixme-test-boundary";

pub const REPAIR_REPLY: &str = r#"{
    "detected_issue": "Worn faucet cartridge",
    "severity": "Medium Severity",
    "description": "Water escapes around the faucet base because the cartridge seals are worn.",
    "estimated_price": {"low": 120, "high": 280},
    "confidence": 82
}"#;

/// Counts calls and either returns a fixed reply or fails with a provider error.
pub struct StubAnalyzer {
    reply: Option<String>,
    configured: bool,
    calls: AtomicUsize,
    images_seen: AtomicUsize,
}

impl StubAnalyzer {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            configured: true,
            calls: AtomicUsize::new(0),
            images_seen: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::failing()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn images_seen(&self) -> usize {
        self.images_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionAnalyzer for StubAnalyzer {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn analyze(&self, prompt: &AnalysisPrompt<'_>) -> Result<String, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.images_seen.fetch_add(prompt.images.len(), Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(AnalyzerError::Provider {
                status: 500,
                body: "simulated upstream failure".to_string(),
            }),
        }
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn image<'a>(filename: &'a str, data: &'static [u8]) -> Part<'a> {
    Part::File {
        name: "files",
        filename,
        content_type: "image/png",
        data,
    }
}

pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
