//! Immutable point-in-time copy of every view, handed to presentation layers

use crate::event::FeatureWeight;
use crate::store::{
    AttackTypeCount, ConfusionMatrix, DetectionQuality, DetectionRecord, PerformancePoint,
    RollingMetrics, TrafficPoint,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Store revision the snapshot was taken at
    pub sequence: u64,
    pub generated_at: DateTime<Utc>,
    pub confusion: ConfusionMatrix,
    pub quality: DetectionQuality,
    /// Newest type first
    pub attack_types: Vec<AttackTypeCount>,
    pub feature_importance: Vec<FeatureWeight>,
    /// Newest record first
    pub detections: Vec<DetectionRecord>,
    pub metrics: RollingMetrics,
    /// Oldest point first
    pub traffic: Vec<TrafficPoint>,
    /// Oldest point first
    pub performance: Vec<PerformancePoint>,
}

impl DashboardSnapshot {
    /// Snapshot of a store that has seen nothing yet
    pub fn empty() -> Self {
        Self {
            sequence: 0,
            generated_at: Utc::now(),
            confusion: ConfusionMatrix::new(),
            quality: DetectionQuality::default(),
            attack_types: Vec::new(),
            feature_importance: Vec::new(),
            detections: Vec::new(),
            metrics: RollingMetrics::new(0.0),
            traffic: Vec::new(),
            performance: Vec::new(),
        }
    }

    /// One-line summary for log output
    pub fn summary(&self) -> String {
        let latest = self
            .detections
            .first()
            .map(|r| format!("{} ({}, {})", r.attack_type, r.severity.as_str(), r.status.as_str()))
            .unwrap_or_else(|| "none".to_string());

        let accuracy = self
            .quality
            .accuracy
            .map(|a| format!("{:.2}%", a * 100.0))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "#{} threats={} blocked={} types={} accuracy={} latency={:.1}ms latest={}",
            self.sequence,
            self.metrics.total_threats,
            self.metrics.blocked_count,
            self.attack_types.len(),
            accuracy,
            self.metrics.moving_avg_latency_ms,
            latest
        )
    }
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
