//! Sink trait for exported snapshots
//!
//! A sink receives every published [`DashboardSnapshot`] through
//! [`run_sink`](super::run_sink), in sequence order. It is an export only;
//! nothing in the engine reads a sink back.

use crate::snapshot::DashboardSnapshot;
use async_trait::async_trait;

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err)
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "Snapshot sink IO error: {}", e),
            SinkError::Serialization(e) => write!(f, "Snapshot serialization error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Io(e) => Some(e),
            SinkError::Serialization(e) => Some(e),
        }
    }
}

#[async_trait]
pub trait SnapshotSink: Send {
    /// Write one snapshot. A failure skips only this snapshot; `run_sink`
    /// logs it and keeps draining.
    async fn write_snapshot(&mut self, snapshot: &DashboardSnapshot) -> Result<(), SinkError>;

    /// Called once by `run_sink` after the subscription ends. Backends may
    /// also flush on their own schedule while writing.
    async fn flush(&mut self) -> Result<(), SinkError>;

    /// Backend name used in the sink's start, failure and close log lines
    fn backend_type(&self) -> &'static str;
}
