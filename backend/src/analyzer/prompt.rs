use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::validation::{AnalysisRequest, ImagePayload};

/// Confidence bands shared by the system prompt and the service metadata.
pub const ACCURACY_SCALE: [(&str, &str); 5] = [
    ("90-100", "Very high confidence (clear visual evidence and detailed description)"),
    ("70-89", "High confidence (good evidence but some ambiguity)"),
    ("50-69", "Medium confidence (reasonable evidence but could be multiple possibilities)"),
    ("30-49", "Low confidence (limited or unclear information)"),
    ("0-29", "Very low confidence (insufficient or contradictory information)"),
];

const SYSTEM_PROMPT_HEAD: &str = r#"You are a professional repair and maintenance diagnostic assistant.
Analyze the provided information (images and/or text description) to identify what needs to be fixed.

Consider:
1. If images are provided, analyze them as different angles or aspects of the same problem
2. If text description is provided, use it for context about the issue
3. Provide ONE comprehensive analysis that covers all provided information
4. Assess your own confidence level in the diagnosis

Respond STRICTLY in the following JSON format:
{
    "detected_issue": "Brief title of the main issue",
    "severity": "Low/Medium/High Severity",
    "description": "Detailed explanation of the issue, including likely causes and immediate recommendations",
    "estimated_price": {
        "low": 0,
        "high": 0
    },
    "confidence": 85
}

Guidelines:
1. Analyze the information provided (images and/or description)
2. If multiple issues are present, prioritize the most critical/severe one
3. Be specific and accurate about the issues
4. Assess overall severity based on potential damage, safety risks, and urgency
5. Provide realistic price estimates in USD that cover fixing ALL identified issues
6. If images are unclear, use the description for better context
7. Price should be comprehensive for all repairs needed
8. Provide a confidence score (0-100) representing how confident you are in this diagnosis
   - Consider image clarity, description detail, and your certainty
"#;

pub fn system_prompt() -> String {
    let mut prompt = SYSTEM_PROMPT_HEAD.to_string();
    for (band, meaning) in ACCURACY_SCALE {
        prompt.push_str(&format!("   - {}: {}\n", band, meaning));
    }
    prompt
}

/// What is sent upstream for one request: the instruction text plus the images in order.
#[derive(Debug)]
pub struct AnalysisPrompt<'a> {
    pub system: String,
    pub text: String,
    pub images: &'a [ImagePayload],
}

impl<'a> AnalysisPrompt<'a> {
    pub fn build(request: &'a AnalysisRequest) -> Self {
        let mut text = format!(
            "Analyze this repair issue and provide a confidence score (0-100). User ID: {}",
            request.user_id
        );
        if let Some(description) = &request.description {
            text.push_str(&format!("\n\nUser Description:\n{}", description));
        }
        if request.images.is_empty() {
            text.push_str("\n\nNo images provided - analysis based on text description only.");
        } else {
            text.push_str(&format!("\n\nNumber of images provided: {}", request.images.len()));
        }
        if request.description.is_none() {
            text.push_str("\n\nNo text description provided - analysis based on images only.");
        }

        Self {
            system: system_prompt(),
            text,
            images: &request.images,
        }
    }
}

impl ImagePayload {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}
