//! Notification Sink Port (Driven Port)
//!
//! Fire-and-forget observability channel. Delivery is never awaited and never
//! affects correctness.

use serde_json::Value;

/// Receives notifications about order and session activity.
pub trait NotificationSink: Send + Sync {
    /// Publish `payload` under `event_type`. Must not block.
    fn broadcast(&self, event_type: &str, payload: Value);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn broadcast(&self, _event_type: &str, _payload: Value) {}
}
