use chrono::Utc;
use shared::{AnalysisResponse, PriceRange, Severity};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::parser::{ParsedAnalysis, parse_reply};
use super::{AnalysisPrompt, AnalyzerError, VisionAnalyzer};
use crate::validation::AnalysisRequest;

pub const FAILED_ISSUE: &str = "Analysis Failed";

/// Runs one validated request through the upstream analyzer and shapes the outcome.
#[derive(Clone)]
pub struct AnalysisService {
    analyzer: Arc<dyn VisionAnalyzer>,
    timeout: Duration,
}

impl AnalysisService {
    pub fn new(analyzer: Arc<dyn VisionAnalyzer>, timeout: Duration) -> Self {
        Self { analyzer, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.analyzer.is_configured()
    }

    /// Exactly one upstream call, bounded by the configured timeout.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<ParsedAnalysis, AnalyzerError> {
        let prompt = AnalysisPrompt::build(request);
        let reply = tokio::time::timeout(self.timeout, self.analyzer.analyze(&prompt))
            .await
            .map_err(|_| AnalyzerError::Timeout(self.timeout))??;
        Ok(parse_reply(&reply)?)
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResponse {
        let request_id = Uuid::new_v4();
        log::info!(
            "Analysis {} started for user {} ({} image(s), description: {})",
            request_id,
            request.user_id,
            request.images.len(),
            request.has_description()
        );

        match self.run(request).await {
            Ok(parsed) => {
                log::info!(
                    "Analysis {} completed: {} ({}, accuracy {})",
                    request_id,
                    parsed.detected_issue,
                    parsed.severity,
                    parsed.confidence
                );
                success_response(request, parsed, request_id)
            }
            Err(e) => {
                log::error!("Analysis {} failed: {}", request_id, e);
                failure_response(request, &e, request_id)
            }
        }
    }
}

pub fn success_response(
    request: &AnalysisRequest,
    parsed: ParsedAnalysis,
    request_id: Uuid,
) -> AnalysisResponse {
    let price = parsed.estimated_price;
    AnalysisResponse {
        user_id: request.user_id.clone(),
        detected_issue: parsed.detected_issue,
        severity: parsed.severity,
        description: parsed.description,
        estimated_price: PriceRange::normalized(price.low, price.high),
        accuracy: parsed.confidence.min(100),
        success: true,
        request_id,
        analysis_timestamp: Utc::now(),
        images_analyzed: request.images.len(),
        has_user_description: request.has_description(),
        error_message: None,
    }
}

pub fn failure_response(
    request: &AnalysisRequest,
    error: &AnalyzerError,
    request_id: Uuid,
) -> AnalysisResponse {
    AnalysisResponse {
        user_id: request.user_id.clone(),
        detected_issue: FAILED_ISSUE.to_string(),
        severity: Severity::Low,
        description: error.public_message().to_string(),
        estimated_price: PriceRange::default(),
        accuracy: 0,
        success: false,
        request_id,
        analysis_timestamp: Utc::now(),
        images_analyzed: request.images.len(),
        has_user_description: request.has_description(),
        error_message: Some(error.to_string()),
    }
}
