//! Feed adapters - sources of raw detection messages
//!
//! An adapter owns its connection or file handle and yields one raw message
//! (normally a JSON line) per call. Decoding happens downstream.

pub mod channel;
pub mod lines;
pub mod mock;
pub mod tail;

pub use channel::ChannelFeed;
pub use lines::LineFeed;
pub use mock::{MockFeed, MOCK_LABELS};
pub use tail::TailFeed;

use async_trait::async_trait;

#[derive(Debug)]
pub enum FeedError {
    Io(std::io::Error),
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::Io(err)
    }
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Io(e) => write!(f, "Feed IO error: {}", e),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Io(e) => Some(e),
        }
    }
}

#[async_trait]
pub trait FeedAdapter: Send {
    /// Next raw message; `Ok(None)` once the feed has ended
    async fn next_message(&mut self) -> Result<Option<String>, FeedError>;

    /// Short name for logging
    fn source_name(&self) -> &str;
}
