//! NetGuard - real-time aggregation of intrusion-detection events
//!
//! ```text
//! FeedAdapter → decoder → AggregationStore → ViewPublisher → subscribers / sinks
//! ```

pub mod config;
pub mod decoder;
pub mod event;
pub mod feed;
pub mod ingestion;
pub mod publisher;
pub mod sink;
pub mod snapshot;
pub mod store;

pub use config::{ConfigError, EngineConfig, FeedKind};
pub use decoder::{decode, decode_str, CoercionError, DecodeError};
pub use event::{DetectionEvent, FeatureWeight, Severity};
pub use feed::{ChannelFeed, FeedAdapter, FeedError, LineFeed, MockFeed, TailFeed};
pub use ingestion::{process_message, run_ingestion, IngestStats};
pub use publisher::{Subscription, SubscriptionHandle, ViewPublisher};
pub use sink::{run_sink, JsonlSnapshotWriter, SinkError, SnapshotSink};
pub use snapshot::DashboardSnapshot;
pub use store::{AggregationStore, StoreConfig, ViewDelta, ViewKind, ViewUpdateSkipped};
