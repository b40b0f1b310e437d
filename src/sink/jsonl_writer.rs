//! JSONL snapshot export - one serialized snapshot per line

use super::writer_backend::{SinkError, SnapshotSink};
use crate::snapshot::DashboardSnapshot;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

pub struct JsonlSnapshotWriter {
    writer: BufWriter<std::fs::File>,
    last_flush: Instant,
    written: u64,
}

impl JsonlSnapshotWriter {
    /// Open `path` for appending, creating it if needed
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("📝 Writing snapshots to: {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
            last_flush: Instant::now(),
            written: 0,
        })
    }

    pub fn write_snapshot(&mut self, snapshot: &DashboardSnapshot) -> Result<(), SinkError> {
        let json = serde_json::to_string(snapshot)?;
        writeln!(self.writer, "{}", json)?;
        self.written += 1;

        if self.last_flush.elapsed() > FLUSH_INTERVAL {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Drop for JsonlSnapshotWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[async_trait]
impl SnapshotSink for JsonlSnapshotWriter {
    async fn write_snapshot(&mut self, snapshot: &DashboardSnapshot) -> Result<(), SinkError> {
        JsonlSnapshotWriter::write_snapshot(self, snapshot)
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        JsonlSnapshotWriter::flush(self)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}
