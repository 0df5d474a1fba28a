//! Broadcast notification sink.
//!
//! Fans notifications out to any number of subscribers over a
//! `tokio::sync::broadcast` channel. Slow subscribers lag and lose messages;
//! publishers never wait.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::application::ports::NotificationSink;
use crate::domain::shared::Timestamp;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// One published notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Event name, e.g. `order_executed` or `market_close`.
    pub event_type: String,
    /// Event body.
    pub payload: Value,
    /// When it was published.
    pub at: Timestamp,
}

/// Notification sink backed by a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationSink {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotificationSink {
    /// Create a sink buffering up to `capacity` notifications per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for BroadcastNotificationSink {
    fn broadcast(&self, event_type: &str, payload: Value) {
        let notification = Notification {
            event_type: event_type.to_string(),
            payload,
            at: Timestamp::now(),
        };
        // No subscribers is not an error for a fire-and-forget sink.
        if self.sender.send(notification).is_err() {
            tracing::trace!(event_type, "Notification dropped, no subscribers");
        }
    }
}
