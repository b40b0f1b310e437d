//! Detection log rows and the two rolling chart series

use crate::event::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown when an event carries no source or destination address
pub const UNKNOWN_ADDRESS: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStatus {
    Blocked,
    Monitoring,
}

impl DetectionStatus {
    pub fn from_severity(severity: Severity) -> Self {
        if severity.is_blocking() {
            DetectionStatus::Blocked
        } else {
            DetectionStatus::Monitoring
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::Blocked => "blocked",
            DetectionStatus::Monitoring => "monitoring",
        }
    }
}

/// One row of the detection log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// `DET-<unix millis>-<sequence>`
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub dest_ip: String,
    pub attack_type: String,
    pub severity: Severity,
    pub confidence: f64,
    pub status: DetectionStatus,
}

/// Cumulative benign/malicious counts after an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficPoint {
    pub time: String,
    pub benign: u64,
    pub malicious: u64,
}

/// Event confidence as a percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub time: String,
    pub value: f64,
}

/// Chart label for a series point
pub fn time_label(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_severity() {
        assert_eq!(DetectionStatus::from_severity(Severity::Critical), DetectionStatus::Blocked);
        assert_eq!(DetectionStatus::from_severity(Severity::High), DetectionStatus::Blocked);
        assert_eq!(DetectionStatus::from_severity(Severity::Medium), DetectionStatus::Monitoring);
        assert_eq!(DetectionStatus::from_severity(Severity::Low), DetectionStatus::Monitoring);
    }

    #[test]
    fn test_time_label() {
        let ts = DateTime::<Utc>::from_timestamp(1704810225, 0).unwrap();
        assert_eq!(time_label(&ts), "14:23:45");
    }
}
