//! End-to-end: feed messages through ingestion and observe published snapshots

use netguard::feed::MOCK_LABELS;
use netguard::store::{BinaryClass, DetectionStatus};
use netguard::{
    run_ingestion, run_sink, AggregationStore, ChannelFeed, DashboardSnapshot,
    JsonlSnapshotWriter, MockFeed, StoreConfig, TailFeed, ViewPublisher,
};
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;

fn detection_message(index: usize) -> String {
    json!({
        "event": "detection",
        "payload": {
            "id": format!("pkt_{}", index),
            "pred_label": "PortScan",
            "true_label": "PortScan",
            "score": 0.7,
            "severity": "medium",
            "features": { "src_ip": format!("10.0.0.{}", index) },
        }
    })
    .to_string()
}

async fn ingest(messages: Vec<String>, store: &mut AggregationStore, publisher: &ViewPublisher) {
    let (tx, feed) = ChannelFeed::channel(messages.len().max(1));
    for message in messages {
        tx.send(message).await.unwrap();
    }
    drop(tx);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    run_ingestion(
        Box::new(feed),
        store,
        publisher,
        shutdown_rx,
        Duration::from_secs(60),
    )
    .await;
}

#[tokio::test]
async fn test_ddos_event_end_to_end() {
    let mut store = AggregationStore::with_seed(StoreConfig::default(), 5);
    let publisher = ViewPublisher::new();
    let mut subscription = publisher.subscribe();

    let message = json!({
        "event": "detection",
        "payload": {
            "pred_label": "DDoS",
            "true_label": "DDoS",
            "score": 0.92,
            "severity": "high",
            "features": { "src_ip": "10.0.0.9" },
        }
    })
    .to_string();
    ingest(vec![message], &mut store, &publisher).await;

    let snapshot = subscription.recv().await.unwrap();
    assert_eq!(snapshot.sequence, 1);
    assert_eq!(snapshot.attack_types.len(), 1);
    assert_eq!(snapshot.attack_types[0].attack_type, "DDoS");
    assert_eq!(snapshot.attack_types[0].count, 1);
    assert_eq!(snapshot.confusion.count(BinaryClass::Attack, BinaryClass::Attack), 1);
    assert_eq!(snapshot.confusion.total(), 1);
    assert_eq!(snapshot.metrics.blocked_count, 1);

    let head = &snapshot.detections[0];
    assert_eq!(head.attack_type, "DDoS");
    assert_eq!(head.status, DetectionStatus::Blocked);
    assert_eq!(head.source_ip, "10.0.0.9");
    assert_eq!(head.dest_ip, "N/A");
}

#[tokio::test]
async fn test_unrecognized_message_changes_nothing() {
    let mut store = AggregationStore::with_seed(StoreConfig::default(), 5);
    let publisher = ViewPublisher::new();
    let mut subscription = publisher.subscribe();

    ingest(vec!["{\"foo\":\"bar\"}".to_string()], &mut store, &publisher).await;

    assert_eq!(store.sequence(), 0);
    assert!(store.detections().is_empty());
    assert_eq!(store.attack_types().total(), 0);
    assert_eq!(publisher.current_snapshot().sequence, 0);
    assert!(subscription.try_recv().is_none());
}

#[tokio::test]
async fn test_eleven_events_evict_oldest_log_row() {
    let mut store = AggregationStore::with_seed(StoreConfig::default(), 5);
    let publisher = ViewPublisher::new();

    let messages = (1..=11).map(detection_message).collect();
    ingest(messages, &mut store, &publisher).await;

    let snapshot = publisher.current_snapshot();
    assert_eq!(snapshot.sequence, 11);
    assert_eq!(snapshot.detections.len(), 10);
    assert_eq!(snapshot.detections[0].source_ip, "10.0.0.11");
    assert!(snapshot.detections.iter().all(|r| r.source_ip != "10.0.0.1"));
    assert_eq!(snapshot.traffic.len(), 6);
    assert_eq!(snapshot.confusion.total(), 11);
    assert_eq!(snapshot.attack_types[0].count, 11);
}

#[tokio::test]
async fn test_mock_feed_into_jsonl_export() {
    let temp_dir = tempfile::tempdir().unwrap();
    let export_path = temp_dir.path().join("snapshots.jsonl");

    let mut store = AggregationStore::with_seed(StoreConfig::default(), 11);
    let publisher = ViewPublisher::new();
    let writer = JsonlSnapshotWriter::new(&export_path).unwrap();
    let sink_task = tokio::spawn(run_sink(publisher.subscribe(), Box::new(writer)));

    let feed = MockFeed::new(Duration::ZERO, Some(11))
        .with_true_labels(0.8)
        .with_limit(25);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let stats = run_ingestion(
        Box::new(feed),
        &mut store,
        &publisher,
        shutdown_rx,
        Duration::from_secs(60),
    )
    .await;
    assert_eq!(stats.accepted, 25);
    assert_eq!(stats.rejected, 0);

    drop(publisher);
    assert_eq!(sink_task.await.unwrap(), 25);

    let content = std::fs::read_to_string(&export_path).unwrap();
    let snapshots: Vec<DashboardSnapshot> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(snapshots.len(), 25);
    assert!(snapshots.windows(2).all(|w| w[0].sequence < w[1].sequence));

    let last = snapshots.last().unwrap();
    assert_eq!(last.confusion.total(), 25);
    assert_eq!(last.attack_types.iter().map(|a| a.count).sum::<u64>(), 25);
    assert!(last
        .attack_types
        .iter()
        .all(|a| MOCK_LABELS.contains(&a.attack_type.as_str())));
}

#[tokio::test]
async fn test_tail_feed_replay() {
    let temp_dir = tempfile::tempdir().unwrap();
    let feed_path = temp_dir.path().join("detections.jsonl");
    let lines: Vec<String> = (1..=3).map(detection_message).collect();
    std::fs::write(&feed_path, lines.join("\n") + "\n").unwrap();

    let mut store = AggregationStore::with_seed(StoreConfig::default(), 5);
    let publisher = ViewPublisher::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher = publisher.clone();
    let handle = tokio::spawn(async move {
        let feed = TailFeed::from_start(feed_path).with_poll_interval(Duration::from_millis(10));
        run_ingestion(
            Box::new(feed),
            &mut store,
            &publisher,
            shutdown_rx,
            Duration::from_secs(60),
        )
        .await
    });

    // A tail never ends on its own; stop it once everything was applied
    tokio::time::timeout(Duration::from_secs(5), async {
        while watcher.current_snapshot().sequence < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    shutdown_tx.send(true).unwrap();

    let stats = handle.await.unwrap();
    assert_eq!(stats.accepted, 3);
    assert_eq!(watcher.current_snapshot().detections[0].source_ip, "10.0.0.3");
}
