//! Ingestion loop - feed → decode → apply → publish
//!
//! One task owns the [`AggregationStore`]. Each message is decoded, applied
//! and published before the next one is awaited, so subscribers see
//! snapshots in arrival order and the store is never shared.

use crate::decoder::decode_str;
use crate::feed::FeedAdapter;
use crate::publisher::ViewPublisher;
use crate::store::AggregationStore;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Counters reported when ingestion stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Raw messages taken from the feed
    pub received: u64,
    /// Messages decoded and applied
    pub accepted: u64,
    /// Malformed or unrecognized messages dropped
    pub rejected: u64,
    /// Individual view updates skipped across all accepted events
    pub skipped_view_updates: u64,
}

/// Handle one raw message. Returns whether it was applied.
pub fn process_message(
    raw: &str,
    store: &mut AggregationStore,
    publisher: &ViewPublisher,
    stats: &mut IngestStats,
) -> bool {
    stats.received += 1;

    let event = match decode_str(raw) {
        Ok(event) => event,
        Err(e) => {
            stats.rejected += 1;
            log::debug!("Dropping message: {}", e);
            return false;
        }
    };

    let delta = store.apply(&event);
    stats.accepted += 1;
    stats.skipped_view_updates += delta.skipped.len() as u64;
    for skipped in &delta.skipped {
        log::debug!("Event #{}: {}", delta.sequence, skipped);
    }

    publisher.publish(store.snapshot());
    true
}

/// Run until the feed ends, the feed fails, or `shutdown` turns true.
///
/// Throughput is logged every `stats_interval`. Shutdown only interrupts
/// the wait for the next message; a received message is always finished.
pub async fn run_ingestion(
    mut feed: Box<dyn FeedAdapter>,
    store: &mut AggregationStore,
    publisher: &ViewPublisher,
    mut shutdown: watch::Receiver<bool>,
    stats_interval: Duration,
) -> IngestStats {
    log::info!("🚀 Starting ingestion from {}", feed.source_name());

    let mut stats = IngestStats::default();
    let mut window_received = 0u64;
    let mut last_log_time = Instant::now();
    let mut shutdown_live = true;

    loop {
        if *shutdown.borrow() {
            log::info!("🛑 Shutdown requested, stopping ingestion");
            break;
        }

        tokio::select! {
            changed = shutdown.changed(), if shutdown_live => {
                if changed.is_err() {
                    // Sender gone without signalling; run until the feed ends
                    shutdown_live = false;
                }
            }

            message = feed.next_message() => {
                match message {
                    Ok(Some(raw)) => {
                        process_message(&raw, store, publisher, &mut stats);
                        window_received += 1;

                        if last_log_time.elapsed() >= stats_interval {
                            let rate = window_received as f64 / last_log_time.elapsed().as_secs_f64();
                            log::info!(
                                "📊 Ingestion rate: {:.1} msg/sec (received: {}, rejected: {}, skipped views: {})",
                                rate,
                                stats.received,
                                stats.rejected,
                                stats.skipped_view_updates
                            );
                            last_log_time = Instant::now();
                            window_received = 0;
                        }
                    }
                    Ok(None) => {
                        log::info!("Feed {} ended", feed.source_name());
                        break;
                    }
                    Err(e) => {
                        log::error!("❌ Feed {} failed: {}", feed.source_name(), e);
                        break;
                    }
                }
            }
        }
    }

    log::info!(
        "✅ Ingestion stopped: {} received, {} accepted, {} rejected, {} view updates skipped",
        stats.received,
        stats.accepted,
        stats.rejected,
        stats.skipped_view_updates
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ChannelFeed;
    use crate::store::StoreConfig;

    fn create_test_message(label: &str, true_label: Option<&str>) -> String {
        let mut payload = serde_json::json!({
            "pred_label": label,
            "score": 0.9,
            "severity": "high",
            "features": { "src_ip": "10.0.0.9" },
        });
        if let Some(actual) = true_label {
            payload["true_label"] = serde_json::json!(actual);
        }
        serde_json::json!({ "event": "detection", "payload": payload }).to_string()
    }

    #[test]
    fn test_process_message_counts() {
        let mut store = AggregationStore::with_seed(StoreConfig::default(), 1);
        let publisher = ViewPublisher::new();
        let mut stats = IngestStats::default();

        assert!(process_message(&create_test_message("DoS", Some("DoS")), &mut store, &publisher, &mut stats));
        assert!(!process_message("{\"foo\":\"bar\"}", &mut store, &publisher, &mut stats));
        assert!(!process_message("not json", &mut store, &publisher, &mut stats));
        assert!(process_message(&create_test_message("PortScan", None), &mut store, &publisher, &mut stats));

        assert_eq!(
            stats,
            IngestStats {
                received: 4,
                accepted: 2,
                rejected: 2,
                skipped_view_updates: 1,
            }
        );
        assert_eq!(store.sequence(), 2);
        assert_eq!(publisher.current_snapshot().sequence, 2);
    }

    #[tokio::test]
    async fn test_run_until_feed_ends() {
        let (tx, feed) = ChannelFeed::channel(32);
        let mut store = AggregationStore::with_seed(StoreConfig::default(), 1);
        let publisher = ViewPublisher::new();
        let mut subscription = publisher.subscribe();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        for _ in 0..3 {
            tx.send(create_test_message("DoS", None)).await.unwrap();
        }
        drop(tx);

        let stats = run_ingestion(
            Box::new(feed),
            &mut store,
            &publisher,
            shutdown_rx,
            Duration::from_secs(10),
        )
        .await;

        assert_eq!(stats.accepted, 3);
        for expected in 1..=3 {
            assert_eq!(subscription.try_recv().map(|s| s.sequence), Some(expected));
        }
        assert!(subscription.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_waiting() {
        let (tx, feed) = ChannelFeed::channel(8);
        let mut store = AggregationStore::with_seed(StoreConfig::default(), 1);
        let publisher = ViewPublisher::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(create_test_message("DoS", None)).await.unwrap();

        let handle = tokio::spawn(async move {
            let stats = run_ingestion(
                Box::new(feed),
                &mut store,
                &publisher,
                shutdown_rx,
                Duration::from_secs(10),
            )
            .await;
            (stats, store.sequence())
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let (stats, sequence) = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.accepted, 1);
        assert_eq!(sequence, 1);
        // Sender still alive: only the shutdown signal could have stopped it
        drop(tx);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_runs_to_feed_end() {
        let (tx, feed) = ChannelFeed::channel(8);
        let mut store = AggregationStore::with_seed(StoreConfig::default(), 1);
        let publisher = ViewPublisher::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);

        tx.send(create_test_message("Benign", Some("Benign"))).await.unwrap();
        drop(tx);

        let stats = run_ingestion(
            Box::new(feed),
            &mut store,
            &publisher,
            shutdown_rx,
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(stats.accepted, 1);
        assert_eq!(store.confusion().total(), 1);
    }
}
