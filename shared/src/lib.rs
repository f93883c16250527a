use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

pub const MAX_IMAGES: usize = 10;
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, Default)]
pub enum Severity {
    #[serde(rename = "Low Severity")]
    #[strum(serialize = "Low Severity")]
    Low,
    #[serde(rename = "Medium Severity")]
    #[strum(serialize = "Medium Severity")]
    #[default]
    Medium,
    #[serde(rename = "High Severity")]
    #[strum(serialize = "High Severity")]
    High,
}

impl Severity {
    /// Maps a free-form label such as "high", "HIGH SEVERITY" or "Moderate" onto a level.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let leading = label
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|word| !word.is_empty())
            .unwrap_or_default();
        match leading {
            "high" | "critical" | "severe" => return Some(Severity::High),
            "medium" | "moderate" => return Some(Severity::Medium),
            "low" | "minor" => return Some(Severity::Low),
            _ => {}
        }
        if label.contains("high") || label.contains("critical") || label.contains("severe") {
            Some(Severity::High)
        } else if label.contains("medium") || label.contains("moderate") {
            Some(Severity::Medium)
        } else if label.contains("low") || label.contains("minor") {
            Some(Severity::Low)
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

impl PriceRange {
    /// Negative bounds become zero and an inverted range is swapped.
    pub fn normalized(low: f64, high: f64) -> Self {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let (low, high) = (clean(low), clean(high));
        if high < low {
            Self { low: high, high: low }
        } else {
            Self { low, high }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalysisResponse {
    pub user_id: String,
    pub detected_issue: String,
    pub severity: Severity,
    pub description: String,
    pub estimated_price: PriceRange,
    pub accuracy: u8,
    pub success: bool,
    pub request_id: Uuid,
    pub analysis_timestamp: DateTime<Utc>,
    pub images_analyzed: usize,
    pub has_user_description: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileError {
    pub filename: String,
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FileError>,
    pub success: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub openai_status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
    pub input_options: Vec<String>,
    pub accuracy_scale: BTreeMap<String, String>,
    pub limits: BTreeMap<String, LimitValue>,
}

/// Limits are either plain counts or human readable sizes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum LimitValue {
    Count(usize),
    Text(String),
}
