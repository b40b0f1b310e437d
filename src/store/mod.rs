//! Aggregation Store - derived views over the detection stream
//!
//! # Architecture
//!
//! ```text
//! DetectionEvent → AggregationStore::apply()
//!     ├─ AttackTypeCounters        (needs predicted label)
//!     ├─ ConfusionMatrix           (needs predicted + true label)
//!     ├─ FeatureImportanceRanking  (replace or jitter)
//!     ├─ RollingMetrics
//!     ├─ detection log             (newest first, capacity K)
//!     └─ traffic / performance     (FIFO, capacity W)
//!     ↓
//! AggregationStore::snapshot() → DashboardSnapshot
//! ```
//!
//! Views are updated independently: an event that cannot feed one view is
//! recorded as a [`ViewUpdateSkipped`] and still reaches the others.

pub mod aggregation;
pub mod attack_types;
pub mod confusion;
pub mod features;
pub mod metrics;
pub mod records;
pub mod window;

pub use aggregation::{
    AggregationStore, SkipReason, StoreConfig, ViewDelta, ViewKind, ViewUpdateSkipped,
    DEFAULT_FEATURE_JITTER, DEFAULT_LOG_CAPACITY, DEFAULT_SERIES_WINDOW,
};
pub use attack_types::{AttackTypeCount, AttackTypeCounters};
pub use confusion::{BinaryClass, ConfusionCell, ConfusionMatrix, DetectionQuality};
pub use features::{default_features, FeatureImportanceRanking};
pub use metrics::{LatencyModel, RollingMetrics};
pub use records::{DetectionRecord, DetectionStatus, PerformancePoint, TrafficPoint};
pub use window::BoundedWindow;
