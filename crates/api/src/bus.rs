//! In-process change bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ChangeBus`] is the publish/subscribe hub for [`ChangeEvent`]s. Every
//! successful mutation handler publishes the affected row here, and the
//! `/changes` WebSocket forwards the stream to connected clients. Shared via
//! `Arc<ChangeBus>` across the application.

use tokio::sync::broadcast;

use repatlas_core::change::ChangeEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out change bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ChangeEvent`].
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// polling clients will pick the change up from the fingerprint.
    pub fn publish(&self, event: ChangeEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repatlas_core::change::ChangeKind;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = ChangeBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ChangeEvent::new(
            "events",
            ChangeKind::Insert,
            serde_json::json!({"id": 42}),
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.collection, "events");
        assert_eq!(received.kind, ChangeKind::Insert);
        assert_eq!(received.row.unwrap()["id"], 42);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = ChangeBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ChangeEvent::refresh("representatives"));

        assert_eq!(rx1.recv().await.unwrap().collection, "representatives");
        assert_eq!(rx2.recv().await.unwrap().collection, "representatives");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = ChangeBus::default();
        bus.publish(ChangeEvent::refresh("events"));
    }
}
