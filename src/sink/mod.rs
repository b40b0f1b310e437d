//! Snapshot sinks - export of published snapshots

pub mod jsonl_writer;
pub mod writer_backend;

pub use jsonl_writer::JsonlSnapshotWriter;
pub use writer_backend::{SinkError, SnapshotSink};

use crate::publisher::Subscription;

/// Drain `subscription` into `sink` until the publisher goes away.
///
/// Write failures are logged and the snapshot is skipped. Returns the number
/// of snapshots written.
pub async fn run_sink(mut subscription: Subscription, mut sink: Box<dyn SnapshotSink>) -> u64 {
    log::info!(
        "💾 {} sink attached (subscription {})",
        sink.backend_type(),
        subscription.id()
    );

    let mut written = 0u64;
    while let Some(snapshot) = subscription.recv().await {
        match sink.write_snapshot(&snapshot).await {
            Ok(()) => written += 1,
            Err(e) => log::warn!("⚠️  Failed to export snapshot #{}: {}", snapshot.sequence, e),
        }
    }

    if let Err(e) = sink.flush().await {
        log::warn!("⚠️  Final {} flush failed: {}", sink.backend_type(), e);
    }

    log::info!("✅ {} sink closed after {} snapshots", sink.backend_type(), written);
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::ViewPublisher;
    use crate::snapshot::DashboardSnapshot;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct MemorySink {
        sequences: Arc<Mutex<Vec<u64>>>,
        fail_on: Option<u64>,
    }

    #[async_trait]
    impl SnapshotSink for MemorySink {
        async fn write_snapshot(&mut self, snapshot: &DashboardSnapshot) -> Result<(), SinkError> {
            if self.fail_on == Some(snapshot.sequence) {
                return Err(SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.sequences.lock().unwrap().push(snapshot.sequence);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), SinkError> {
            Ok(())
        }

        fn backend_type(&self) -> &'static str {
            "memory"
        }
    }

    #[tokio::test]
    async fn test_run_sink_drains_until_publisher_dropped() {
        let publisher = ViewPublisher::new();
        let sequences = Arc::new(Mutex::new(Vec::new()));
        let sink = MemorySink {
            sequences: sequences.clone(),
            fail_on: Some(2),
        };

        let task = tokio::spawn(run_sink(publisher.subscribe(), Box::new(sink)));

        for sequence in 1..=3 {
            publisher.publish(DashboardSnapshot {
                sequence,
                ..DashboardSnapshot::empty()
            });
        }
        drop(publisher);

        let written = task.await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(*sequences.lock().unwrap(), vec![1, 3]);
    }
}
