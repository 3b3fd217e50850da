//! Change subscription manager.
//!
//! Consumers subscribe to a collection and get change notifications over the
//! best transport available: a WebSocket push channel when it can be
//! established within the connect timeout, otherwise the fingerprint-gated
//! [`PollingEngine`]. A push channel that drops mid-stream is replaced with
//! polling transparently; subscribers never see the transport.
//!
//! Subscriptions are reference-counted per collection. One transport serves
//! every subscriber of a collection, and cancelling the last handle tears the
//! transport down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use repatlas_core::change::ChangeEvent;
use repatlas_core::fingerprint::{fingerprint_rows, Fingerprint};

use crate::config::SyncConfig;
use crate::poller::{ChangeCallback, FingerprintFetcher, PollSubscription, PollingEngine};
use crate::remote::RemoteStore;

enum Transport {
    Push(tokio::task::JoinHandle<()>),
    Poll(PollSubscription),
}

struct TopicState {
    /// `None` while the transport is still being established.
    transport: Option<Transport>,
    /// Kept so a dropped push channel can be replaced with polling.
    fetch: FingerprintFetcher,
    subscribers: HashMap<u64, ChangeCallback>,
}

struct Inner {
    topics: HashMap<String, TopicState>,
    next_id: u64,
}

/// Shared subscription manager. Construct once per client and hand out
/// [`FeedHandle`]s from [`ChangeFeed::subscribe`].
pub struct ChangeFeed {
    config: SyncConfig,
    poller: Arc<PollingEngine>,
    inner: Mutex<Inner>,
}

impl ChangeFeed {
    pub fn new(config: SyncConfig) -> Arc<Self> {
        let poller = PollingEngine::new(config.poll_interval);
        Arc::new(Self {
            config,
            poller,
            inner: Mutex::new(Inner {
                topics: HashMap::new(),
                next_id: 0,
            }),
        })
    }

    /// Subscribe to change notifications for one collection.
    ///
    /// `fetch` supplies the collection fingerprint should the subscription
    /// fall back to polling. The returned handle is the only way to cancel;
    /// dropping it cancels too.
    pub async fn subscribe(
        self: &Arc<Self>,
        collection: &str,
        fetch: FingerprintFetcher,
        callback: ChangeCallback,
    ) -> FeedHandle {
        let id = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let id = inner.next_id;
            inner.next_id += 1;

            if let Some(state) = inner.topics.get_mut(collection) {
                // Piggyback on the existing (or in-flight) transport.
                state.subscribers.insert(id, callback);
                return FeedHandle {
                    feed: Arc::downgrade(self),
                    topic: collection.to_string(),
                    id,
                };
            }

            let mut subscribers = HashMap::new();
            subscribers.insert(id, callback);
            inner.topics.insert(
                collection.to_string(),
                TopicState {
                    transport: None,
                    fetch: Arc::clone(&fetch),
                    subscribers,
                },
            );
            id
        };

        // Establish outside the lock; concurrent subscribers attach to the
        // entry inserted above.
        let transport = self.establish_transport(collection, &fetch).await;
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match inner.topics.get_mut(collection) {
                Some(state) if !state.subscribers.is_empty() => {
                    state.transport = Some(transport);
                }
                // Everyone cancelled while we were connecting.
                _ => teardown(transport),
            }
        }

        FeedHandle {
            feed: Arc::downgrade(self),
            topic: collection.to_string(),
            id,
        }
    }

    async fn establish_transport(
        self: &Arc<Self>,
        topic: &str,
        fetch: &FingerprintFetcher,
    ) -> Transport {
        let connect = connect_async(self.config.ws_url.as_str());
        match tokio::time::timeout(self.config.connect_timeout, connect).await {
            Ok(Ok((stream, _response))) => {
                info!(topic, url = %self.config.ws_url, "Change feed connected over WebSocket");
                let task = tokio::spawn(run_push(Arc::downgrade(self), topic.to_string(), stream));
                Transport::Push(task)
            }
            Ok(Err(err)) => {
                warn!(topic, error = %err, "Push channel unavailable; falling back to polling");
                self.poll_transport(topic, fetch)
            }
            Err(_) => {
                warn!(topic, "Push channel connect timed out; falling back to polling");
                self.poll_transport(topic, fetch)
            }
        }
    }

    fn poll_transport(self: &Arc<Self>, topic: &str, fetch: &FingerprintFetcher) -> Transport {
        let feed = Arc::downgrade(self);
        let topic_name = topic.to_string();
        let callback: ChangeCallback = Arc::new(move |event| {
            if let Some(feed) = feed.upgrade() {
                feed.dispatch(&topic_name, event);
            }
        });
        Transport::Poll(self.poller.subscribe(topic, Arc::clone(fetch), callback))
    }

    /// Replace a dropped push channel with polling, if the topic still has
    /// subscribers.
    fn fallback_to_polling(self: &Arc<Self>, topic: &str) {
        let fetch = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match inner.topics.get(topic) {
                Some(state) if !state.subscribers.is_empty() => Arc::clone(&state.fetch),
                _ => return,
            }
        };
        warn!(topic, "Push channel lost; switching to polling");
        let transport = self.poll_transport(topic, &fetch);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.topics.get_mut(topic) {
            Some(state) if !state.subscribers.is_empty() => {
                state.transport = Some(transport);
            }
            _ => teardown(transport),
        }
    }

    /// Fan one event out to the topic's current subscribers. Callbacks are
    /// invoked outside the lock.
    fn dispatch(&self, topic: &str, event: ChangeEvent) {
        let callbacks: Vec<ChangeCallback> = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match inner.topics.get(topic) {
                Some(state) => state.subscribers.values().cloned().collect(),
                None => return,
            }
        };
        for callback in callbacks {
            callback(event.clone());
        }
    }

    fn remove_subscriber(&self, topic: &str, id: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = inner.topics.get_mut(topic) else {
            return;
        };
        state.subscribers.remove(&id);
        if state.subscribers.is_empty() {
            debug!(topic, "Last subscriber cancelled; tearing down transport");
            if let Some(state) = inner.topics.remove(topic) {
                if let Some(transport) = state.transport {
                    teardown(transport);
                }
            }
        }
    }
}

fn teardown(transport: Transport) {
    match transport {
        Transport::Push(task) => task.abort(),
        Transport::Poll(subscription) => subscription.cancel(),
    }
}

/// Reader task for one push channel. Exits when the stream ends, arranging a
/// polling replacement for any remaining subscribers.
async fn run_push(
    feed: Weak<ChangeFeed>,
    topic: String,
    mut stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ChangeEvent>(&text) {
                Ok(event) if event.collection == topic => {
                    let Some(feed) = feed.upgrade() else { return };
                    feed.dispatch(&topic, event);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(topic, error = %err, "Ignoring malformed change message");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(topic, error = %err, "Push channel read failed");
                break;
            }
        }
    }
    if let Some(feed) = feed.upgrade() {
        feed.fallback_to_polling(&topic);
    }
}

/// Build a [`FingerprintFetcher`] that lists a collection over HTTP and
/// summarizes it, for wiring a subscription's polling fallback.
pub fn remote_fingerprint(store: RemoteStore, path: &'static str) -> FingerprintFetcher {
    Arc::new(move || {
        let store = store.clone();
        Box::pin(async move {
            let rows: Vec<serde_json::Value> = store.list(path).await?;
            Ok(wire_rows_fingerprint(&rows))
        })
    })
}

/// Fingerprint raw wire rows by (id, updatedAt). Signup rows are stamped
/// `signedUpAt` instead; rows missing both are skipped.
fn wire_rows_fingerprint(rows: &[serde_json::Value]) -> Fingerprint {
    fingerprint_rows(rows.iter().filter_map(|row| {
        let id = row.get("id")?.as_i64()?;
        let stamp = row
            .get("updatedAt")
            .or_else(|| row.get("signedUpAt"))?
            .as_str()?;
        Some((id, stamp.parse().ok()?))
    }))
}

/// Handle for one feed subscription; the single cancellation capability.
pub struct FeedHandle {
    feed: Weak<ChangeFeed>,
    topic: String,
    id: u64,
}

impl FeedHandle {
    pub fn cancel(self) {
        // Teardown happens in Drop.
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.upgrade() {
            feed.remove_subscriber(&self.topic, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use futures::SinkExt;
    use repatlas_core::change::ChangeKind;

    fn test_config(ws_url: String) -> SyncConfig {
        let mut config = SyncConfig::new("http://localhost:9", "/tmp/repatlas-feed-tests");
        config.ws_url = ws_url;
        config.poll_interval = Duration::from_millis(20);
        config.connect_timeout = Duration::from_millis(250);
        config
    }

    fn versioned_fetcher(
        version: Arc<AtomicU64>,
        fetches: Arc<AtomicUsize>,
    ) -> FingerprintFetcher {
        Arc::new(move || {
            let version = Arc::clone(&version);
            let fetches = Arc::clone(&fetches);
            Box::pin(async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                let ts = Utc
                    .timestamp_opt(version.load(Ordering::SeqCst) as i64, 0)
                    .unwrap();
                Ok(fingerprint_rows([(1, ts)]))
            })
        })
    }

    fn counting_callback(fired: Arc<AtomicUsize>) -> ChangeCallback {
        Arc::new(move |_event| {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn wire_rows_use_whichever_stamp_the_collection_carries() {
        let events = vec![
            serde_json::json!({"id": 1, "title": "a", "updatedAt": "2026-01-01T00:00:00Z"}),
            serde_json::json!({"id": 2, "title": "b", "updatedAt": "2026-01-02T00:00:00Z"}),
        ];
        let signups = vec![
            serde_json::json!({"id": 1, "email": "x@y.z", "signedUpAt": "2026-01-01T00:00:00Z"}),
            serde_json::json!({"id": 2, "email": "w@y.z", "signedUpAt": "2026-01-02T00:00:00Z"}),
        ];
        // Same (id, stamp) pairs regardless of the field name.
        assert_eq!(wire_rows_fingerprint(&events), wire_rows_fingerprint(&signups));

        let touched = vec![
            serde_json::json!({"id": 1, "title": "a", "updatedAt": "2026-01-01T00:00:00Z"}),
            serde_json::json!({"id": 2, "title": "b", "updatedAt": "2026-01-03T00:00:00Z"}),
        ];
        assert_ne!(wire_rows_fingerprint(&events), wire_rows_fingerprint(&touched));
    }

    #[tokio::test]
    async fn unreachable_push_channel_falls_back_to_polling() {
        // Nothing listens on the discard port, so the connect fails fast.
        let feed = ChangeFeed::new(test_config("ws://127.0.0.1:9".into()));
        let version = Arc::new(AtomicU64::new(1));
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = feed
            .subscribe(
                "events",
                versioned_fetcher(Arc::clone(&version), Arc::new(AtomicUsize::new(0))),
                counting_callback(Arc::clone(&fired)),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "priming must not notify");

        version.store(2, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        handle.cancel();
    }

    #[tokio::test]
    async fn push_channel_delivers_without_polling() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            let event =
                ChangeEvent::new("events", ChangeKind::Update, serde_json::json!({"id": 7}));
            let body = serde_json::to_string(&event).unwrap();
            ws.send(Message::Text(body.into())).await.unwrap();
            // Hold the connection open so the client stays on push.
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let feed = ChangeFeed::new(test_config(format!("ws://{addr}")));
        let fetches = Arc::new(AtomicUsize::new(0));
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = feed
            .subscribe(
                "events",
                versioned_fetcher(Arc::new(AtomicU64::new(1)), Arc::clone(&fetches)),
                counting_callback(Arc::clone(&fired)),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 0, "push must not poll");
        handle.cancel();
    }

    #[tokio::test]
    async fn dropped_push_channel_switches_to_polling() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            // Close immediately: the client must replace push with polling.
            drop(ws);
        });

        let feed = ChangeFeed::new(test_config(format!("ws://{addr}")));
        let version = Arc::new(AtomicU64::new(1));
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = feed
            .subscribe(
                "events",
                versioned_fetcher(Arc::clone(&version), Arc::new(AtomicUsize::new(0))),
                counting_callback(Arc::clone(&fired)),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        version.store(2, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        handle.cancel();
    }

    #[tokio::test]
    async fn cancelling_one_handle_leaves_others_subscribed() {
        let feed = ChangeFeed::new(test_config("ws://127.0.0.1:9".into()));
        let version = Arc::new(AtomicU64::new(1));
        let fetches = Arc::new(AtomicUsize::new(0));
        let fired_a = Arc::new(AtomicUsize::new(0));
        let fired_b = Arc::new(AtomicUsize::new(0));

        let handle_a = feed
            .subscribe(
                "reps",
                versioned_fetcher(Arc::clone(&version), Arc::clone(&fetches)),
                counting_callback(Arc::clone(&fired_a)),
            )
            .await;
        let handle_b = feed
            .subscribe(
                "reps",
                versioned_fetcher(Arc::clone(&version), Arc::new(AtomicUsize::new(0))),
                counting_callback(Arc::clone(&fired_b)),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        handle_a.cancel();

        version.store(2, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired_a.load(Ordering::SeqCst), 0);
        assert_eq!(fired_b.load(Ordering::SeqCst), 1);

        // Last cancellation stops the polling transport.
        handle_b.cancel();
        let after = fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), after);
    }
}
