//! Notification Adapters

mod broadcast;

pub use broadcast::{BroadcastNotificationSink, Notification};
