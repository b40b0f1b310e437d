//! Synthetic detection stream for demos and soak runs

use super::{FeedAdapter, FeedError};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

pub const MOCK_LABELS: [&str; 4] = ["Benign", "DoS", "PortScan", "BruteForce"];

const MOCK_SOURCE_IP: &str = "10.0.0.1";
const MOCK_DEST_IP: &str = "10.0.0.5";

pub struct MockFeed {
    rng: StdRng,
    ticker: Option<Interval>,
    limit: Option<u64>,
    emitted: u64,
    true_label_accuracy: Option<f64>,
}

impl MockFeed {
    /// `period` of zero emits back to back
    pub fn new(period: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let ticker = if period.is_zero() {
            None
        } else {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(ticker)
        };

        Self {
            rng,
            ticker,
            limit: None,
            emitted: 0,
            true_label_accuracy: None,
        }
    }

    /// Stop after `limit` messages
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attach a ground-truth label that matches the prediction with the
    /// given probability, so the confusion matrix has data. A non-finite
    /// accuracy leaves true labels off.
    pub fn with_true_labels(mut self, accuracy: f64) -> Self {
        self.true_label_accuracy = if accuracy.is_finite() {
            Some(accuracy.clamp(0.0, 1.0))
        } else {
            log::warn!("Ignoring non-finite mock accuracy {}", accuracy);
            None
        };
        self
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn next_payload(&mut self) -> serde_json::Value {
        let id = format!("pkt_{}", self.rng.gen_range(1..=99_999u32));
        let label = *MOCK_LABELS.choose(&mut self.rng).unwrap_or(&MOCK_LABELS[0]);
        let score = (self.rng.gen_range(0.60..=0.99f64) * 100.0).round() / 100.0;
        let is_attack = label != "Benign";
        let severity = match (is_attack, score > 0.85) {
            (true, true) => "high",
            (true, false) => "medium",
            (false, _) => "low",
        };

        let mut payload = json!({
            "id": id,
            "pred_label": label,
            "score": score,
            "severity": severity,
            "features": {
                "src_ip": MOCK_SOURCE_IP,
                "dst_ip": MOCK_DEST_IP,
            },
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        if let Some(accuracy) = self.true_label_accuracy {
            let true_label = if self.rng.gen_bool(accuracy) {
                label
            } else {
                let others: Vec<&str> = MOCK_LABELS.iter().copied().filter(|l| *l != label).collect();
                *others.choose(&mut self.rng).unwrap_or(&label)
            };
            payload["true_label"] = json!(true_label);
        }

        json!({ "event": "detection", "payload": payload })
    }
}

#[async_trait]
impl FeedAdapter for MockFeed {
    async fn next_message(&mut self) -> Result<Option<String>, FeedError> {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Ok(None);
        }

        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }

        self.emitted += 1;
        Ok(Some(self.next_payload().to_string()))
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}
