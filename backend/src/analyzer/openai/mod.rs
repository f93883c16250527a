mod models;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use url::Url;

use super::{AnalysisPrompt, AnalyzerError, VisionAnalyzer};
use crate::config::AnalyzerConfig;
use models::{
    ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, ImageUrl,
    MessageContent,
};

/// Chat-completions client for OpenAI and API-compatible providers.
#[derive(Clone)]
pub struct OpenAiAnalyzer {
    http_client: HttpClient,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

fn chat_completions_url(base_url: &str) -> Result<Url, url::ParseError> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&base)?.join("chat/completions")
}

fn error_detail(body: String) -> String {
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body,
    }
}

impl OpenAiAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let http_client = HttpClient::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http_client,
            endpoint: chat_completions_url(&config.base_url)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn build_request<'a>(&'a self, prompt: &AnalysisPrompt<'_>) -> ChatCompletionRequest<'a> {
        let user_content = if prompt.images.is_empty() {
            MessageContent::Text(prompt.text.clone())
        } else {
            let mut parts = Vec::with_capacity(prompt.images.len() + 1);
            parts.push(ContentPart::Text {
                text: prompt.text.clone(),
            });
            parts.extend(prompt.images.iter().map(|image| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            }));
            MessageContent::Parts(parts)
        };

        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(prompt.system.clone()),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiAnalyzer {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze(&self, prompt: &AnalysisPrompt<'_>) -> Result<String, AnalyzerError> {
        let api_key = self.api_key.as_deref().ok_or(AnalyzerError::NotConfigured)?;
        let request = self.build_request(prompt);

        log::debug!(
            "Sending chat completion to {} (model {}, {} image(s))",
            self.endpoint,
            self.model,
            prompt.images.len()
        );
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response.text().await?);
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AnalyzerError::RateLimited(detail),
                StatusCode::UNAUTHORIZED => AnalyzerError::Unauthorized(detail),
                _ => AnalyzerError::Provider {
                    status: status.as_u16(),
                    body: detail,
                },
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AnalyzerError::EmptyReply)
    }
}
