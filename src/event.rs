//! Typed detection events produced by the decoder

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown wherever an event carries no usable predicted label
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One classified network-flow observation emitted by the upstream detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub predicted_label: Option<String>,
    pub true_label: Option<String>,
    /// Always within [0, 1]; see [`clamp_confidence`]
    pub confidence: f64,
    pub severity: Severity,
    pub source_address: Option<String>,
    pub dest_address: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Authoritative ranking from the classifier, when it sent one
    pub feature_importance: Option<Vec<FeatureWeight>>,
    /// Upstream packet/flow id (e.g. `pkt_4211`)
    pub flow_id: Option<String>,
}

impl DetectionEvent {
    /// Minimal event with only a predicted label; the rest at defaults
    pub fn new(predicted_label: impl Into<String>) -> Self {
        Self {
            predicted_label: Some(predicted_label.into()),
            true_label: None,
            confidence: 0.0,
            severity: Severity::Low,
            source_address: None,
            dest_address: None,
            timestamp: None,
            feature_importance: None,
            flow_id: None,
        }
    }

    /// Display label, `"Unknown"` when the classifier sent none
    pub fn label(&self) -> &str {
        self.predicted_label.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn with_true_label(mut self, label: impl Into<String>) -> Self {
        self.true_label = Some(label.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Unknown or missing severities are `Low`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Case-insensitive parse; `None` for anything outside the four levels
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// High and critical detections are blocked, the rest only monitored
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

/// One entry of a feature-importance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub importance: f64,
}

impl FeatureWeight {
    pub fn new(feature: impl Into<String>, importance: f64) -> Self {
        Self {
            feature: feature.into(),
            importance,
        }
    }
}

/// Clamp a classifier score into [0, 1]; NaN becomes 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse(" critical "), Some(Severity::Critical));
        assert_eq!(Severity::parse("severe"), None);
        assert_eq!(Severity::parse("severe").unwrap_or_default(), Severity::Low);
    }

    #[test]
    fn test_blocking_levels() {
        assert!(!Severity::Low.is_blocking());
        assert!(!Severity::Medium.is_blocking());
        assert!(Severity::High.is_blocking());
        assert!(Severity::Critical.is_blocking());
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_missing_label_displays_unknown() {
        let mut event = DetectionEvent::new("DoS");
        event.predicted_label = None;
        assert_eq!(event.label(), "Unknown");
    }
}
