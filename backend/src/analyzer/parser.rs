use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use shared::{PriceRange, Severity};

const DEFAULT_DESCRIPTION: &str = "No description provided";
const UNPARSEABLE_CONFIDENCE: u8 = 50;
const ISSUE_KEYS: [&str; 3] = ["detected_issue", "issue", "title"];

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"-?\d+").unwrap();
    static ref AMOUNT: Regex = Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap();
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("reply contains neither a JSON object nor recognizable fields")]
    Unstructured,
    #[error("reply is missing required field: {0}")]
    MissingField(&'static str),
}

/// Fields extracted from a model reply, already clamped into their valid ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysis {
    pub detected_issue: String,
    pub severity: Severity,
    pub description: String,
    pub estimated_price: PriceRange,
    pub confidence: u8,
}

pub fn parse_reply(reply: &str) -> Result<ParsedAnalysis, ParseError> {
    match find_json_object(reply) {
        Some(object) if has_issue(&object) => from_json(&object),
        Some(object) => from_markers(reply).or_else(|_| from_json(&object)),
        None => from_markers(reply),
    }
}

fn has_issue(map: &Map<String, Value>) -> bool {
    ISSUE_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Tries a JSON value at every `{`, so trailing prose or stray braces around the object are ignored.
/// An object naming the issue wins over the first object found.
fn find_json_object(reply: &str) -> Option<Map<String, Value>> {
    let mut first = None;
    for (start, _) in reply.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Value>();
        if let Some(Ok(Value::Object(map))) = values.next() {
            if has_issue(&map) {
                return Some(map);
            }
            first.get_or_insert(map);
        }
    }
    first
}

fn first_string<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn from_json(map: &Map<String, Value>) -> Result<ParsedAnalysis, ParseError> {
    let detected_issue = first_string(map, &ISSUE_KEYS)
        .ok_or(ParseError::MissingField("detected_issue"))?
        .to_string();

    let severity = first_string(map, &["severity"])
        .and_then(Severity::from_label)
        .unwrap_or_default();

    let description = first_string(map, &["description"])
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string();

    let estimated_price = match map.get("estimated_price").or_else(|| map.get("price")) {
        Some(Value::Object(price)) => PriceRange::normalized(
            price.get("low").map(amount_value).unwrap_or(0.0),
            price.get("high").map(amount_value).unwrap_or(0.0),
        ),
        Some(Value::String(text)) => price_from_text(text),
        _ => PriceRange::default(),
    };

    let confidence = match map.get("confidence").or_else(|| map.get("accuracy")) {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n.as_f64().map(clamp_confidence).unwrap_or(UNPARSEABLE_CONFIDENCE),
        Some(Value::String(text)) => confidence_from_text(text),
        Some(_) => UNPARSEABLE_CONFIDENCE,
    };

    Ok(ParsedAnalysis {
        detected_issue,
        severity,
        description,
        estimated_price,
        confidence,
    })
}

fn amount_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(text) => amounts(text).next().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn amounts(text: &str) -> impl Iterator<Item = f64> + '_ {
    AMOUNT
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

fn price_from_text(text: &str) -> PriceRange {
    let mut values = amounts(text);
    match (values.next(), values.next()) {
        (Some(low), Some(high)) => PriceRange::normalized(low, high),
        (Some(single), None) => PriceRange::normalized(single, single),
        _ => PriceRange::default(),
    }
}

fn clamp_confidence(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).trunc() as u8
}

fn confidence_from_text(text: &str) -> u8 {
    INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(|n| n.clamp(0, 100) as u8)
        .unwrap_or(UNPARSEABLE_CONFIDENCE)
}

enum Marker {
    Issue,
    Severity,
    Description,
    Price,
    PriceLow,
    PriceHigh,
    Confidence,
}

fn marker_for(key: &str) -> Option<Marker> {
    let key = key.to_ascii_lowercase().replace('_', " ");
    let key = key.trim();
    match key {
        "detected issue" | "issue" | "title" | "problem" => Some(Marker::Issue),
        "severity" => Some(Marker::Severity),
        "description" | "details" => Some(Marker::Description),
        "low" | "min" | "minimum" => Some(Marker::PriceLow),
        "high" | "max" | "maximum" => Some(Marker::PriceHigh),
        _ if key.contains("price") || key.contains("cost") => Some(Marker::Price),
        _ if key.contains("confidence") || key.contains("accuracy") => Some(Marker::Confidence),
        _ => None,
    }
}

/// Scans `Key: value` lines, tolerating list bullets and markdown emphasis.
fn from_markers(reply: &str) -> Result<ParsedAnalysis, ParseError> {
    let mut detected_issue = None;
    let mut severity = None;
    let mut description = None;
    let mut estimated_price = None;
    let mut price_seen = false;
    let mut price_bounds = (None, None);
    let mut confidence = None;
    let mut matched = false;

    for line in reply.lines() {
        let line = line.trim().trim_start_matches(['-', '*', '#', '>', ' ']);
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim_matches(|c: char| c == '*' || c == '"' || c.is_whitespace());
        let value = value.trim_matches(|c: char| matches!(c, '*' | '"' | ',') || c.is_whitespace());
        let Some(marker) = marker_for(key) else {
            continue;
        };
        matched = true;
        match marker {
            Marker::Issue if !value.is_empty() => {
                detected_issue.get_or_insert_with(|| value.to_string());
            }
            Marker::Severity => {
                severity = severity.or_else(|| Severity::from_label(value));
            }
            Marker::Description if !value.is_empty() => {
                description.get_or_insert_with(|| value.to_string());
            }
            Marker::Price => {
                price_seen = true;
                if estimated_price.is_none() && amounts(value).next().is_some() {
                    estimated_price = Some(price_from_text(value));
                }
            }
            // `low`/`high` only count as bounds once a price key has opened them.
            Marker::PriceLow if price_seen => {
                price_bounds.0 = price_bounds.0.or_else(|| amounts(value).next());
            }
            Marker::PriceHigh if price_seen => {
                price_bounds.1 = price_bounds.1.or_else(|| amounts(value).next());
            }
            Marker::Confidence => {
                confidence.get_or_insert_with(|| confidence_from_text(value));
            }
            _ => {}
        }
    }

    if !matched {
        return Err(ParseError::Unstructured);
    }
    let estimated_price = estimated_price.or(match price_bounds {
        (None, None) => None,
        (low, high) => Some(PriceRange::normalized(
            low.or(high).unwrap_or(0.0),
            high.or(low).unwrap_or(0.0),
        )),
    });
    Ok(ParsedAnalysis {
        detected_issue: detected_issue.ok_or(ParseError::MissingField("detected_issue"))?,
        severity: severity.unwrap_or_default(),
        description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        estimated_price: estimated_price.unwrap_or_default(),
        confidence: confidence.unwrap_or(0),
    })
}
