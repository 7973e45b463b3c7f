//! Page notification channel.
//!
//! The agent runs in an execution context isolated from the pages it
//! controls; the only way it talks back is a fire-and-forget broadcast.
//! Today there is a single message kind, posted when a prediction request
//! fell back to cached data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// A message posted to every controlled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageMessage {
    /// The prediction API was unreachable and a cached copy was served.
    #[serde(rename = "USING_CACHED_DATA")]
    UsingCachedData {
        /// When the fallback happened.
        timestamp: DateTime<Utc>,
    },
}

impl PageMessage {
    /// Create a stale-data notification stamped now.
    pub fn using_cached_data() -> Self {
        PageMessage::UsingCachedData {
            timestamp: Utc::now(),
        }
    }
}

/// Fan-out channel from the agent to all controlled pages.
///
/// Delivery is fire-and-forget: no acknowledgment, no retry, and posting
/// with no pages attached is not an error.
pub struct PageChannel {
    sender: broadcast::Sender<PageMessage>,
    posted: AtomicU64,
}

impl PageChannel {
    /// Create a channel with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            posted: AtomicU64::new(0),
        }
    }

    /// Attach a page; the receiver sees every message posted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PageMessage> {
        self.sender.subscribe()
    }

    /// Post a message to all attached pages.
    pub fn post(&self, message: PageMessage) {
        self.posted.fetch_add(1, Ordering::Relaxed);
        // A send error only means no page is attached right now
        let delivered = self.sender.send(message).unwrap_or(0);
        debug!(pages = delivered, "Posted page message");
    }

    /// Number of currently attached pages.
    pub fn controlled_pages(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total messages posted since creation.
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }
}
