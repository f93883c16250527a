pub mod openai;
pub mod parser;
pub mod prompt;
pub mod service;

use async_trait::async_trait;
use std::time::Duration;

pub use parser::ParseError;
pub use prompt::AnalysisPrompt;
pub use service::AnalysisService;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("OpenAI API key is not configured")]
    NotConfigured,
    #[error("Invalid analyzer endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Authentication error: {0}")]
    Unauthorized(String),
    #[error("Provider error ({status}): {body}")]
    Provider { status: u16, body: String },
    #[error("Model returned an empty reply")]
    EmptyReply,
    #[error("Unable to parse model reply: {0}")]
    Parse(#[from] ParseError),
}

impl AnalyzerError {
    /// Caller-facing explanation; the raw detail only goes into `error_message`.
    pub fn public_message(&self) -> &'static str {
        match self {
            AnalyzerError::RateLimited(_) => "Rate limit exceeded. Please try again later.",
            AnalyzerError::NotConfigured | AnalyzerError::Unauthorized(_) | AnalyzerError::Endpoint(_) => {
                "Server configuration issue. Please contact support."
            }
            _ => "AI analysis failed. Please try again later.",
        }
    }
}

/// The upstream vision model: one prompt in, the model's raw reply text out.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn analyze(&self, prompt: &AnalysisPrompt<'_>) -> Result<String, AnalyzerError>;
}
