//! Event notifications pushed by the twin engine.

use serde::{Deserialize, Serialize};

/// A firing of a registered twin event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNotification {
    pub event_key: String,
    pub payload: serde_json::Value,
    /// Epoch milliseconds of the occurrence.
    pub timestamp_ms: i64,
}

impl EventNotification {
    pub fn new(event_key: impl Into<String>, payload: serde_json::Value, timestamp_ms: i64) -> Self {
        EventNotification {
            event_key: event_key.into(),
            payload,
            timestamp_ms,
        }
    }
}
