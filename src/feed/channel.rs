use super::{FeedAdapter, FeedError};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// In-process feed; ends when every sender is dropped
pub struct ChannelFeed {
    receiver: mpsc::Receiver<String>,
}

impl ChannelFeed {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Bounded channel plus its feed
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl FeedAdapter for ChannelFeed {
    async fn next_message(&mut self) -> Result<Option<String>, FeedError> {
        Ok(self.receiver.recv().await)
    }

    fn source_name(&self) -> &str {
        "channel"
    }
}
