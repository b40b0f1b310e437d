//! NetGuard runtime - live detection aggregation
//!
//! Reads detection events from the configured feed, keeps every dashboard
//! view up to date and publishes a snapshot after each event.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin netguard
//! NETGUARD_FEED=file NETGUARD_FEED_PATH=streams/detections.jsonl cargo run --bin netguard
//! ```
//!
//! See [`netguard::EngineConfig`] for environment variables.

use netguard::{
    run_ingestion, run_sink, AggregationStore, EngineConfig, FeedAdapter, FeedKind,
    JsonlSnapshotWriter, LineFeed, MockFeed, TailFeed, ViewPublisher,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

fn build_feed(config: &EngineConfig) -> Result<Box<dyn FeedAdapter>, Box<dyn std::error::Error>> {
    let feed: Box<dyn FeedAdapter> = match config.feed {
        FeedKind::Stdin => Box::new(LineFeed::stdin()),
        FeedKind::File => {
            let path = config
                .feed_path
                .clone()
                .ok_or("NETGUARD_FEED_PATH is required for the file feed")?;
            Box::new(TailFeed::new(path))
        }
        FeedKind::Mock => {
            let mut feed = MockFeed::new(config.mock_interval(), config.mock_seed);
            if let Some(accuracy) = config.mock_accuracy {
                feed = feed.with_true_labels(accuracy);
            }
            Box::new(feed)
        }
    };
    Ok(feed)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = EngineConfig::from_env()?;

    log::info!("🚀 Starting NetGuard detection aggregator");
    log::info!("   Feed: {}", config.feed.as_str());
    if let Some(path) = &config.feed_path {
        log::info!("   Feed path: {}", path.display());
    }
    if config.feed == FeedKind::Mock {
        log::info!("   Mock interval: {}ms", config.mock_interval_ms);
    }
    log::info!("   Detection log capacity: {}", config.log_capacity);
    log::info!("   Series window: {}", config.series_window);
    log::info!("   Feature jitter: {}", config.feature_jitter);
    log::info!(
        "   Latency model: {}ms ± {}ms",
        config.base_latency_ms,
        config.latency_jitter_ms
    );
    match &config.snapshot_path {
        Some(path) => log::info!("   Snapshot export: {}", path.display()),
        None => log::info!("   Snapshot export: disabled"),
    }

    let feed = build_feed(&config)?;
    let mut store = match config.mock_seed {
        Some(seed) => AggregationStore::with_seed(config.store_config(), seed),
        None => AggregationStore::new(config.store_config()),
    };
    let publisher = ViewPublisher::new();

    if config.summary_every > 0 {
        let every = config.summary_every;
        let published = Arc::new(AtomicU64::new(0));
        publisher.subscribe_fn(move |snapshot| {
            let count = published.fetch_add(1, Ordering::Relaxed) + 1;
            if count % every == 0 {
                log::info!("📈 {}", snapshot.summary());
            }
        });
    }

    let sink_task = match &config.snapshot_path {
        Some(path) => {
            let writer = JsonlSnapshotWriter::new(path)?;
            Some(tokio::spawn(run_sink(publisher.subscribe(), Box::new(writer))))
        }
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("🛑 Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let stats = run_ingestion(
        feed,
        &mut store,
        &publisher,
        shutdown_rx,
        config.stats_interval(),
    )
    .await;

    let last = publisher.current_snapshot();
    log::info!("Final state: {}", last.summary());

    // Dropping the last publisher handle ends the sink's subscription
    drop(publisher);
    if let Some(task) = sink_task {
        let written = task.await?;
        log::info!("💾 Exported {} snapshots", written);
    }

    log::info!(
        "✅ NetGuard stopped ({} accepted / {} received)",
        stats.accepted,
        stats.received
    );
    Ok(())
}
