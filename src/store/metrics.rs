//! Scalar counters updated once per event

use super::confusion::BinaryClass;
use super::records::DetectionStatus;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weight of the newest latency sample in the moving average
pub const LATENCY_SMOOTHING: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingMetrics {
    pub total_threats: u64,
    pub blocked_count: u64,
    pub benign_count: u64,
    pub malicious_count: u64,
    pub moving_avg_latency_ms: f64,
}

impl RollingMetrics {
    pub fn new(initial_latency_ms: f64) -> Self {
        Self {
            total_threats: 0,
            blocked_count: 0,
            benign_count: 0,
            malicious_count: 0,
            moving_avg_latency_ms: initial_latency_ms.max(0.0),
        }
    }

    /// `class` is the binarized predicted label, `None` when it was missing
    pub fn record(&mut self, class: Option<BinaryClass>, status: DetectionStatus, latency_sample_ms: f64) {
        self.total_threats += 1;

        if status == DetectionStatus::Blocked {
            self.blocked_count += 1;
        }

        match class {
            Some(BinaryClass::Benign) => self.benign_count += 1,
            Some(BinaryClass::Attack) => self.malicious_count += 1,
            None => {}
        }

        if latency_sample_ms.is_finite() {
            self.moving_avg_latency_ms = (1.0 - LATENCY_SMOOTHING) * self.moving_avg_latency_ms
                + LATENCY_SMOOTHING * latency_sample_ms.max(0.0);
        }
    }
}

/// Synthesizes per-event processing latency samples around a base value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyModel {
    pub base_ms: f64,
    pub jitter_ms: f64,
}

impl LatencyModel {
    pub fn new(base_ms: f64, jitter_ms: f64) -> Self {
        Self { base_ms, jitter_ms }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let jitter_ms = self.jitter_ms;
        let jitter = if jitter_ms.is_finite() && jitter_ms > 0.0 && (2.0 * jitter_ms).is_finite() {
            rng.gen_range(-jitter_ms..=jitter_ms)
        } else {
            0.0
        };
        (self.base_ms + jitter).max(0.0)
    }
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self::new(12.0, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_blocked_counting() {
        let mut metrics = RollingMetrics::new(12.0);
        metrics.record(Some(BinaryClass::Attack), DetectionStatus::Blocked, 12.0);
        metrics.record(Some(BinaryClass::Attack), DetectionStatus::Monitoring, 12.0);
        metrics.record(None, DetectionStatus::Monitoring, 12.0);

        assert_eq!(metrics.total_threats, 3);
        assert_eq!(metrics.blocked_count, 1);
        assert_eq!(metrics.malicious_count, 2);
        assert_eq!(metrics.benign_count, 0);
    }

    #[test]
    fn test_latency_moves_toward_samples() {
        let mut metrics = RollingMetrics::new(10.0);
        metrics.record(None, DetectionStatus::Monitoring, 20.0);
        assert!((metrics.moving_avg_latency_ms - 11.0).abs() < 1e-9);

        // Non-finite samples leave the average alone
        metrics.record(None, DetectionStatus::Monitoring, f64::NAN);
        assert!((metrics.moving_avg_latency_ms - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_latency_model_bounds() {
        let model = LatencyModel::new(1.0, 2.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let sample = model.sample(&mut rng);
            assert!((0.0..=3.0).contains(&sample));
        }

        let flat = LatencyModel::new(5.0, 0.0);
        assert_eq!(flat.sample(&mut rng), 5.0);
    }

    #[test]
    fn test_latency_model_oversized_jitter() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(LatencyModel::new(12.0, 1e308).sample(&mut rng), 12.0);
        assert_eq!(LatencyModel::new(12.0, f64::INFINITY).sample(&mut rng), 12.0);
    }
}
