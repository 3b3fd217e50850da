//! Change-notification wire types shared by the server-side change bus,
//! the WebSocket feed, and the client-side polling fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of change a notification describes.
///
/// The polling fallback cannot distinguish field-level deltas, so every
/// consumer must tolerate [`ChangeKind::Refresh`] — "something changed,
/// re-fetch the collection".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Refresh,
}

/// A change that occurred in one entity collection.
///
/// Published on the server's change bus after every successful mutation and
/// forwarded verbatim over the `/changes` WebSocket. The polling engine
/// synthesizes `Refresh` events with no row payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Collection name, e.g. `"representatives"` or `"events"`.
    pub collection: String,

    /// What happened.
    pub kind: ChangeKind,

    /// The affected row, where the transport can supply it. `None` for
    /// synthesized `Refresh` notifications.
    pub row: Option<serde_json::Value>,

    /// When the change was observed (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event carrying the affected row.
    pub fn new(collection: impl Into<String>, kind: ChangeKind, row: serde_json::Value) -> Self {
        Self {
            collection: collection.into(),
            kind,
            row: Some(row),
            timestamp: Utc::now(),
        }
    }

    /// Create a generic "re-fetch" notification with no row payload.
    pub fn refresh(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            kind: ChangeKind::Refresh,
            row: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_has_no_row() {
        let event = ChangeEvent::refresh("events");
        assert_eq!(event.collection, "events");
        assert_eq!(event.kind, ChangeKind::Refresh);
        assert!(event.row.is_none());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ChangeKind::Insert).unwrap();
        assert_eq!(json, "\"insert\"");
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = ChangeEvent::new(
            "representatives",
            ChangeKind::Update,
            serde_json::json!({"id": 3}),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ChangeKind::Update);
        assert_eq!(back.row.unwrap()["id"], 3);
    }
}
