//! The single-writer store applying detection events to every view

use super::attack_types::AttackTypeCounters;
use super::confusion::{BinaryClass, ConfusionMatrix};
use super::features::{default_features, FeatureImportanceRanking};
use super::metrics::{LatencyModel, RollingMetrics};
use super::records::{
    time_label, DetectionRecord, DetectionStatus, PerformancePoint, TrafficPoint, UNKNOWN_ADDRESS,
};
use super::window::BoundedWindow;
use crate::event::{DetectionEvent, FeatureWeight};
use crate::snapshot::DashboardSnapshot;
use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};

/// Detection log rows kept by default
pub const DEFAULT_LOG_CAPACITY: usize = 10;
/// Points kept per chart series by default
pub const DEFAULT_SERIES_WINDOW: usize = 6;
/// Default feature-importance drift per event
pub const DEFAULT_FEATURE_JITTER: f64 = 0.005;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub log_capacity: usize,
    pub series_window: usize,
    pub feature_jitter: f64,
    pub latency: LatencyModel,
    pub initial_features: Vec<FeatureWeight>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            series_window: DEFAULT_SERIES_WINDOW,
            feature_jitter: DEFAULT_FEATURE_JITTER,
            latency: LatencyModel::default(),
            initial_features: default_features(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    AttackTypes,
    Confusion,
    FeatureImportance,
    Metrics,
    DetectionLog,
    TimeSeries,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::AttackTypes => "attack_types",
            ViewKind::Confusion => "confusion",
            ViewKind::FeatureImportance => "feature_importance",
            ViewKind::Metrics => "metrics",
            ViewKind::DetectionLog => "detection_log",
            ViewKind::TimeSeries => "time_series",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPredictedLabel,
    MissingTrueLabel,
    NoUsableFeatureWeights,
}

/// One view left untouched for one event; the other views still applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdateSkipped {
    pub view: ViewKind,
    pub reason: SkipReason,
}

impl std::fmt::Display for ViewUpdateSkipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self.reason {
            SkipReason::MissingPredictedLabel => "missing predicted label",
            SkipReason::MissingTrueLabel => "missing true label",
            SkipReason::NoUsableFeatureWeights => "no usable feature weights",
        };
        write!(f, "Skipped {} update: {}", self.view.as_str(), reason)
    }
}

impl std::error::Error for ViewUpdateSkipped {}

/// What a single `apply` changed
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDelta {
    pub sequence: u64,
    pub updated: Vec<ViewKind>,
    pub skipped: Vec<ViewUpdateSkipped>,
}

impl ViewDelta {
    fn new(sequence: u64) -> Self {
        Self {
            sequence,
            updated: Vec::with_capacity(6),
            skipped: Vec::new(),
        }
    }

    fn update(&mut self, view: ViewKind) {
        self.updated.push(view);
    }

    fn skip(&mut self, view: ViewKind, reason: SkipReason) {
        self.skipped.push(ViewUpdateSkipped { view, reason });
    }

    pub fn was_updated(&self, view: ViewKind) -> bool {
        self.updated.contains(&view)
    }
}

/// Owns every derived view. Exactly one task applies events to it.
pub struct AggregationStore {
    config: StoreConfig,
    attack_types: AttackTypeCounters,
    confusion: ConfusionMatrix,
    features: FeatureImportanceRanking,
    metrics: RollingMetrics,
    detections: BoundedWindow<DetectionRecord>,
    traffic: BoundedWindow<TrafficPoint>,
    performance: BoundedWindow<PerformancePoint>,
    /// State revision, bumped by every apply and reset
    sequence: u64,
    /// Disambiguator for record ids; never reset
    record_seq: u64,
    rng: StdRng,
    /// Timestamp function (for testing with fixed time)
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AggregationStore {
    /// Store using system time and an entropy-seeded RNG
    pub fn new(config: StoreConfig) -> Self {
        Self::with_parts(config, StdRng::from_entropy(), Box::new(Utc::now))
    }

    /// Deterministic jitter for reproducible runs and tests
    pub fn with_seed(config: StoreConfig, seed: u64) -> Self {
        Self::with_parts(config, StdRng::seed_from_u64(seed), Box::new(Utc::now))
    }

    pub fn with_parts(
        config: StoreConfig,
        rng: StdRng,
        now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    ) -> Self {
        let features = FeatureImportanceRanking::new(config.initial_features.clone());
        let metrics = RollingMetrics::new(config.latency.base_ms);

        Self {
            attack_types: AttackTypeCounters::new(),
            confusion: ConfusionMatrix::new(),
            features,
            metrics,
            detections: BoundedWindow::new(config.log_capacity),
            traffic: BoundedWindow::new(config.series_window),
            performance: BoundedWindow::new(config.series_window),
            sequence: 0,
            record_seq: 0,
            rng,
            now_fn,
            config,
        }
    }

    /// Apply one event to all views as a single logical step.
    ///
    /// Never fails: a view lacking the fields it needs is reported in the
    /// returned delta and left as it was.
    pub fn apply(&mut self, event: &DetectionEvent) -> ViewDelta {
        self.sequence += 1;
        let now = (self.now_fn)();
        let mut delta = ViewDelta::new(self.sequence);

        let predicted = event.predicted_label.as_deref();

        // 1. attack type counters
        match predicted {
            Some(label) => {
                self.attack_types.record(label);
                delta.update(ViewKind::AttackTypes);
            }
            None => delta.skip(ViewKind::AttackTypes, SkipReason::MissingPredictedLabel),
        }

        // 2. confusion matrix
        match (predicted, event.true_label.as_deref()) {
            (Some(predicted), Some(actual)) => {
                self.confusion.record(predicted, actual);
                delta.update(ViewKind::Confusion);
            }
            (None, _) => delta.skip(ViewKind::Confusion, SkipReason::MissingPredictedLabel),
            (Some(_), None) => delta.skip(ViewKind::Confusion, SkipReason::MissingTrueLabel),
        }

        // 3. feature importance
        match &event.feature_importance {
            Some(weights) => {
                if self.features.replace(weights) {
                    delta.update(ViewKind::FeatureImportance);
                } else {
                    delta.skip(ViewKind::FeatureImportance, SkipReason::NoUsableFeatureWeights);
                }
            }
            None => {
                self.features.perturb(&mut self.rng, self.config.feature_jitter);
                delta.update(ViewKind::FeatureImportance);
            }
        }

        // 4. rolling metrics
        let status = DetectionStatus::from_severity(event.severity);
        let class = predicted.map(BinaryClass::from_label);
        let latency = self.config.latency.sample(&mut self.rng);
        self.metrics.record(class, status, latency);
        delta.update(ViewKind::Metrics);

        // 5. detection log
        let timestamp = event.timestamp.unwrap_or(now);
        self.record_seq += 1;
        let record = DetectionRecord {
            id: format!("DET-{}-{}", now.timestamp_millis(), self.record_seq),
            timestamp,
            source_ip: event
                .source_address
                .clone()
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
            dest_ip: event
                .dest_address
                .clone()
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
            attack_type: event.label().to_string(),
            severity: event.severity,
            confidence: event.confidence,
            status,
        };
        self.detections.push_front(record);
        delta.update(ViewKind::DetectionLog);

        // 6. time series
        let time = time_label(&timestamp);
        self.traffic.push_back(TrafficPoint {
            time: time.clone(),
            benign: self.metrics.benign_count,
            malicious: self.metrics.malicious_count,
        });
        self.performance.push_back(PerformancePoint {
            time,
            value: event.confidence * 100.0,
        });
        delta.update(ViewKind::TimeSeries);

        delta
    }

    /// Consistent copy of every view at the current sequence
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            sequence: self.sequence,
            generated_at: (self.now_fn)(),
            confusion: self.confusion.clone(),
            quality: self.confusion.quality(),
            attack_types: self.attack_types.entries().to_vec(),
            feature_importance: self.features.entries().to_vec(),
            detections: self.detections.to_vec(),
            metrics: self.metrics.clone(),
            traffic: self.traffic.to_vec(),
            performance: self.performance.to_vec(),
        }
    }

    /// Clear every view. Counts as a revision, so the snapshot taken
    /// afterwards still orders after the ones before it.
    pub fn reset(&mut self) {
        self.sequence += 1;
        self.attack_types.reset();
        self.confusion.reset();
        self.features = FeatureImportanceRanking::new(self.config.initial_features.clone());
        self.metrics = RollingMetrics::new(self.config.latency.base_ms);
        self.detections.clear();
        self.traffic.clear();
        self.performance.clear();
        log::info!("Aggregation store reset at sequence {}", self.sequence);
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn attack_types(&self) -> &AttackTypeCounters {
        &self.attack_types
    }

    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    pub fn feature_importance(&self) -> &FeatureImportanceRanking {
        &self.features
    }

    pub fn metrics(&self) -> &RollingMetrics {
        &self.metrics
    }

    /// Newest record first
    pub fn detections(&self) -> &BoundedWindow<DetectionRecord> {
        &self.detections
    }

    pub fn traffic(&self) -> &BoundedWindow<TrafficPoint> {
        &self.traffic
    }

    pub fn performance(&self) -> &BoundedWindow<PerformancePoint> {
        &self.performance
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
