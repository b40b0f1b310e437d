//! Runtime configuration from environment variables

use crate::store::{
    default_features, LatencyModel, StoreConfig, DEFAULT_FEATURE_JITTER, DEFAULT_LOG_CAPACITY,
    DEFAULT_SERIES_WINDOW,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Importances live in [0, 1]; a larger per-event drift is meaningless
const MAX_FEATURE_JITTER: f64 = 1.0;
/// Upper bound for the synthesized latency base and jitter
const MAX_LATENCY_MS: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Stdin,
    File,
    Mock,
}

impl FeedKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "stdin" => Some(FeedKind::Stdin),
            "file" => Some(FeedKind::File),
            "mock" => Some(FeedKind::Mock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Stdin => "stdin",
            FeedKind::File => "file",
            FeedKind::Mock => "mock",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the `netguard` runtime
///
/// Environment variables:
/// - `NETGUARD_FEED` (`stdin`, `file` or `mock`; default: mock)
/// - `NETGUARD_FEED_PATH` (required for `file`)
/// - `NETGUARD_LOG_CAPACITY` (default: 10)
/// - `NETGUARD_SERIES_WINDOW` (default: 6)
/// - `NETGUARD_FEATURE_JITTER` (default: 0.005)
/// - `NETGUARD_BASE_LATENCY_MS` (default: 12.0)
/// - `NETGUARD_LATENCY_JITTER_MS` (default: 2.0)
/// - `NETGUARD_MOCK_INTERVAL_MS` (default: 1500)
/// - `NETGUARD_MOCK_SEED` (optional)
/// - `NETGUARD_MOCK_ACCURACY` (optional, attaches true labels to mock events)
/// - `NETGUARD_SNAPSHOT_PATH` (optional JSONL export)
/// - `NETGUARD_STATS_INTERVAL_SECS` (default: 10)
/// - `NETGUARD_SUMMARY_EVERY` (default: 10)
/// - `RUST_LOG` (default: info)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub feed: FeedKind,
    pub feed_path: Option<PathBuf>,
    pub log_capacity: usize,
    pub series_window: usize,
    pub feature_jitter: f64,
    pub base_latency_ms: f64,
    pub latency_jitter_ms: f64,
    pub mock_interval_ms: u64,
    pub mock_seed: Option<u64>,
    pub mock_accuracy: Option<f64>,
    pub snapshot_path: Option<PathBuf>,
    pub stats_interval_secs: u64,
    /// Log a summary line for every N-th published snapshot (0 disables)
    pub summary_every: u64,
    pub rust_log: String,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let feed_str = lookup("NETGUARD_FEED").unwrap_or_else(|| "mock".to_string());
        let feed = FeedKind::parse(&feed_str).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "NETGUARD_FEED must be stdin, file or mock, got '{}'",
                feed_str
            ))
        })?;

        let feed_path = non_empty("NETGUARD_FEED_PATH").map(PathBuf::from);
        if feed == FeedKind::File && feed_path.is_none() {
            return Err(ConfigError::MissingVariable("NETGUARD_FEED_PATH".to_string()));
        }

        let log_capacity = lookup("NETGUARD_LOG_CAPACITY")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_LOG_CAPACITY)
            .max(1);

        let series_window = lookup("NETGUARD_SERIES_WINDOW")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_SERIES_WINDOW)
            .max(1);

        // Parseable but out-of-range values are errors, not silent defaults
        let bounded = |key: &str, default: f64, max: f64| -> Result<f64, ConfigError> {
            match parsed(key) {
                None => Ok(default),
                Some(value) if value.is_finite() && (0.0..=max).contains(&value) => Ok(value),
                Some(value) => Err(ConfigError::InvalidValue(format!(
                    "{} must be between 0 and {}, got {}",
                    key, max, value
                ))),
            }
        };

        let feature_jitter = bounded(
            "NETGUARD_FEATURE_JITTER",
            DEFAULT_FEATURE_JITTER,
            MAX_FEATURE_JITTER,
        )?;
        let base_latency_ms = bounded("NETGUARD_BASE_LATENCY_MS", 12.0, MAX_LATENCY_MS)?;
        let latency_jitter_ms = bounded("NETGUARD_LATENCY_JITTER_MS", 2.0, MAX_LATENCY_MS)?;

        let mock_accuracy = parsed("NETGUARD_MOCK_ACCURACY")
            .filter(|a| a.is_finite())
            .map(|a| a.clamp(0.0, 1.0));

        Ok(Self {
            feed,
            feed_path,
            log_capacity,
            series_window,
            feature_jitter,
            base_latency_ms,
            latency_jitter_ms,
            mock_interval_ms: lookup("NETGUARD_MOCK_INTERVAL_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1_500),
            mock_seed: lookup("NETGUARD_MOCK_SEED").and_then(|s| s.trim().parse().ok()),
            mock_accuracy,
            snapshot_path: non_empty("NETGUARD_SNAPSHOT_PATH").map(PathBuf::from),
            stats_interval_secs: lookup("NETGUARD_STATS_INTERVAL_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(10),
            summary_every: lookup("NETGUARD_SUMMARY_EVERY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(10),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            log_capacity: self.log_capacity,
            series_window: self.series_window,
            feature_jitter: self.feature_jitter,
            latency: LatencyModel::new(self.base_latency_ms, self.latency_jitter_ms),
            initial_features: default_features(),
        }
    }

    pub fn mock_interval(&self) -> Duration {
        Duration::from_millis(self.mock_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs.max(1))
    }
}
