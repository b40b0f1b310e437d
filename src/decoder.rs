//! Normalization of raw feed messages into [`DetectionEvent`]s
//!
//! Upstream producers disagree on field names, so every canonical field is
//! looked up through a closed alias table (JSON pointers into the payload).
//! The first alias holding a usable value wins, in table order.

use crate::event::{clamp_confidence, DetectionEvent, FeatureWeight, Severity};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// The only event tag the decoder accepts
pub const DETECTION_TAG: &str = "detection";

const PREDICTED_LABEL: &[&str] = &["/pred_label", "/label", "/predicted"];
const TRUE_LABEL: &[&str] = &["/true_label", "/trueLabel", "/actual"];
const CONFIDENCE: &[&str] = &["/score", "/confidence"];
const SEVERITY: &[&str] = &["/severity"];
const SOURCE_ADDRESS: &[&str] = &[
    "/features/src_ip",
    "/features/sourceIP",
    "/src_ip",
    "/sourceIP",
];
const DEST_ADDRESS: &[&str] = &[
    "/features/dst_ip",
    "/features/destIP",
    "/dst_ip",
    "/destIP",
];
const FEATURE_IMPORTANCE: &[&str] = &["/feature_importance", "/featureImportance"];
const TIMESTAMP: &[&str] = &["/timestamp"];
const FLOW_ID: &[&str] = &["/id"];

/// Unix timestamps above this are taken as milliseconds
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

#[derive(Debug)]
pub enum DecodeError {
    Malformed(serde_json::Error),
    NotAnObject,
    UnrecognizedEvent(String),
    MissingPayload,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed(err)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "Malformed message: {}", e),
            DecodeError::NotAnObject => write!(f, "Message is not a JSON object"),
            DecodeError::UnrecognizedEvent(tag) => write!(f, "Unrecognized event tag: {}", tag),
            DecodeError::MissingPayload => write!(f, "Missing or non-object payload"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

/// A numeric field that could not be read; recovered with 0
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionError {
    pub field: &'static str,
    pub raw: String,
}

impl std::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot coerce {} value {} to a number", self.field, self.raw)
    }
}

impl std::error::Error for CoercionError {}

/// Decode a raw text message, logging and dropping anything unusable
pub fn decode(raw: &str) -> Option<DetectionEvent> {
    match decode_str(raw) {
        Ok(event) => Some(event),
        Err(e) => {
            log::debug!("Dropping feed message: {}", e);
            None
        }
    }
}

pub fn decode_str(raw: &str) -> Result<DetectionEvent, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    decode_value(&value)
}

pub fn decode_value(raw: &Value) -> Result<DetectionEvent, DecodeError> {
    let message = raw.as_object().ok_or(DecodeError::NotAnObject)?;

    match message.get("event") {
        Some(Value::String(tag)) if tag == DETECTION_TAG => {}
        Some(other) => return Err(DecodeError::UnrecognizedEvent(other.to_string())),
        None => return Err(DecodeError::UnrecognizedEvent("<missing>".to_string())),
    }

    let payload = match message.get("payload") {
        Some(payload @ Value::Object(_)) => payload,
        _ => return Err(DecodeError::MissingPayload),
    };

    let confidence = lookup(payload, CONFIDENCE)
        .map(|value| number_or_zero(value, "score"))
        .unwrap_or(0.0);

    let severity = lookup_text(payload, SEVERITY)
        .and_then(|s| Severity::parse(&s))
        .unwrap_or_default();

    Ok(DetectionEvent {
        predicted_label: lookup_text(payload, PREDICTED_LABEL),
        true_label: lookup_text(payload, TRUE_LABEL),
        confidence: clamp_confidence(confidence),
        severity,
        source_address: lookup_text(payload, SOURCE_ADDRESS),
        dest_address: lookup_text(payload, DEST_ADDRESS),
        timestamp: lookup(payload, TIMESTAMP).and_then(parse_timestamp),
        feature_importance: lookup(payload, FEATURE_IMPORTANCE).and_then(parse_feature_importance),
        flow_id: lookup_text(payload, FLOW_ID),
    })
}

/// Read a number, accepting numeric text
pub fn coerce_number(value: &Value, field: &'static str) -> Result<f64, CoercionError> {
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    coerced.ok_or_else(|| CoercionError {
        field,
        raw: value.to_string(),
    })
}

fn number_or_zero(value: &Value, field: &'static str) -> f64 {
    coerce_number(value, field).unwrap_or_else(|e| {
        log::debug!("{}, using 0", e);
        0.0
    })
}

/// First alias whose value is neither null nor blank text
fn lookup<'a>(payload: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn lookup_text(payload: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_text(s.trim()),
        Value::Number(n) => n.as_f64().and_then(timestamp_from_unix),
        _ => None,
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // The demo back-end sends naive local-less timestamps, taken as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    text.parse::<f64>().ok().and_then(timestamp_from_unix)
}

fn timestamp_from_unix(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let millis = if value > MILLIS_THRESHOLD {
        value as i64
    } else {
        (value * 1000.0) as i64
    };

    DateTime::<Utc>::from_timestamp(
        millis.div_euclid(1000),
        (millis.rem_euclid(1000) * 1_000_000) as u32,
    )
}

/// Empty or unusable lists decode as absent so the ranking keeps evolving
fn parse_feature_importance(value: &Value) -> Option<Vec<FeatureWeight>> {
    let items = value.as_array()?;

    let weights: Vec<FeatureWeight> = items
        .iter()
        .filter_map(|item| {
            let feature = match item.get("feature") {
                Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                _ => return None,
            };
            let importance = item
                .get("importance")
                .filter(|v| !v.is_null())
                .map(|v| number_or_zero(v, "importance"))
                .unwrap_or(0.0);
            Some(FeatureWeight::new(feature, importance))
        })
        .collect();

    if weights.is_empty() {
        None
    } else {
        Some(weights)
    }
}
