//! Fingerprint-gated polling engine.
//!
//! The fallback transport for change subscriptions when the push channel
//! cannot be established. One shared timer drives every registered topic;
//! each tick fetches a collection fingerprint and notifies subscribers only
//! when it differs from the previous one. The first successful fetch for a
//! topic primes the fingerprint without notifying anyone.
//!
//! A fetch failure is logged and skipped; the previous fingerprint is kept so
//! the change is still detected once the remote store recovers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use repatlas_core::change::ChangeEvent;
use repatlas_core::fingerprint::Fingerprint;

use crate::remote::RemoteError;

/// Callback invoked with each change notification.
pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Fetches the current fingerprint of one collection.
pub type FingerprintFetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Fingerprint, RemoteError>> + Send + Sync>;

struct Topic {
    fetch: FingerprintFetcher,
    subscribers: HashMap<u64, ChangeCallback>,
    last_fingerprint: Option<Fingerprint>,
}

struct Inner {
    topics: HashMap<String, Topic>,
    next_id: u64,
    subscriber_count: usize,
    loop_token: Option<CancellationToken>,
}

/// Shared polling engine. The timer task runs only while at least one
/// subscription is live and stops when the last one is cancelled.
pub struct PollingEngine {
    interval: Duration,
    inner: Mutex<Inner>,
}

impl PollingEngine {
    pub fn new(interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            interval,
            inner: Mutex::new(Inner {
                topics: HashMap::new(),
                next_id: 0,
                subscriber_count: 0,
                loop_token: None,
            }),
        })
    }

    /// Register a subscriber for a topic. The first subscription overall
    /// starts the timer task; the fetcher is shared by every subscriber of
    /// the same topic (the first registration wins).
    pub fn subscribe(
        self: &Arc<Self>,
        topic: &str,
        fetch: FingerprintFetcher,
        callback: ChangeCallback,
    ) -> PollSubscription {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = inner.next_id;
        inner.next_id += 1;

        inner
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic {
                fetch,
                subscribers: HashMap::new(),
                last_fingerprint: None,
            })
            .subscribers
            .insert(id, callback);
        inner.subscriber_count += 1;

        if inner.loop_token.is_none() {
            let token = CancellationToken::new();
            inner.loop_token = Some(token.clone());
            debug!(interval = ?self.interval, "Starting polling loop");
            tokio::spawn(run_loop(Arc::downgrade(self), token, self.interval));
        }

        PollSubscription {
            engine: Arc::downgrade(self),
            topic: topic.to_string(),
            id,
        }
    }

    fn unsubscribe(&self, topic: &str, id: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = inner.topics.get_mut(topic) else {
            return;
        };
        if state.subscribers.remove(&id).is_some() {
            inner.subscriber_count -= 1;
        }
        if inner
            .topics
            .get(topic)
            .is_some_and(|t| t.subscribers.is_empty())
        {
            inner.topics.remove(topic);
        }
        if inner.subscriber_count == 0 {
            if let Some(token) = inner.loop_token.take() {
                debug!("Last subscription cancelled; stopping polling loop");
                token.cancel();
            }
        }
    }

    async fn tick(&self) {
        // Snapshot the fetchers so no lock is held across an await.
        let work: Vec<(String, FingerprintFetcher)> = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner
                .topics
                .iter()
                .map(|(name, topic)| (name.clone(), Arc::clone(&topic.fetch)))
                .collect()
        };

        for (name, fetch) in work {
            match fetch().await {
                Ok(fingerprint) => self.apply_fingerprint(&name, fingerprint),
                Err(err) => {
                    warn!(topic = %name, error = %err, "Poll fetch failed; will retry next tick");
                }
            }
        }
    }

    /// Record a fetched fingerprint and notify subscribers on a transition.
    /// Subscribers are re-read after the fetch, so a cancellation that raced
    /// the fetch is honored.
    fn apply_fingerprint(&self, topic: &str, fingerprint: Fingerprint) {
        let callbacks: Vec<ChangeCallback> = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let Some(state) = inner.topics.get_mut(topic) else {
                return;
            };
            let changed = state
                .last_fingerprint
                .as_ref()
                .is_some_and(|prev| *prev != fingerprint);
            state.last_fingerprint = Some(fingerprint);
            if changed {
                state.subscribers.values().cloned().collect()
            } else {
                Vec::new()
            }
        };

        if callbacks.is_empty() {
            return;
        }
        debug!(topic, "Fingerprint changed; notifying subscribers");
        let event = ChangeEvent::refresh(topic);
        for callback in callbacks {
            callback(event.clone());
        }
    }
}

async fn run_loop(engine: Weak<PollingEngine>, token: CancellationToken, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(engine) = engine.upgrade() else { break };
                engine.tick().await;
            }
        }
    }
}

/// Handle for one polling subscription. Cancelling the last handle for a
/// topic stops polling that topic; cancelling the last handle overall stops
/// the timer task.
pub struct PollSubscription {
    engine: Weak<PollingEngine>,
    topic: String,
    id: u64,
}

impl PollSubscription {
    pub fn cancel(self) {
        // Teardown happens in Drop.
    }
}

impl Drop for PollSubscription {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.unsubscribe(&self.topic, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use repatlas_core::fingerprint::fingerprint_rows;

    const TICK: Duration = Duration::from_millis(20);

    fn fingerprint_for(version: i64) -> Fingerprint {
        fingerprint_rows([(1, Utc.timestamp_opt(version, 0).unwrap())])
    }

    /// Fetcher that reports a fingerprint derived from a shared version
    /// counter, counting its own invocations.
    fn versioned_fetcher(
        version: Arc<AtomicU64>,
        fetches: Arc<AtomicUsize>,
    ) -> FingerprintFetcher {
        Arc::new(move || {
            let version = Arc::clone(&version);
            let fetches = Arc::clone(&fetches);
            Box::pin(async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(fingerprint_for(version.load(Ordering::SeqCst) as i64))
            })
        })
    }

    fn counting_callback(fired: Arc<AtomicUsize>) -> ChangeCallback {
        Arc::new(move |_event| {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn settle() {
        tokio::time::sleep(TICK * 6).await;
    }

    #[tokio::test]
    async fn unchanged_fingerprint_never_notifies() {
        let engine = PollingEngine::new(TICK);
        let fetches = Arc::new(AtomicUsize::new(0));
        let fired = Arc::new(AtomicUsize::new(0));

        let sub = engine.subscribe(
            "events",
            versioned_fetcher(Arc::new(AtomicU64::new(1)), Arc::clone(&fetches)),
            counting_callback(Arc::clone(&fired)),
        );
        settle().await;

        assert!(fetches.load(Ordering::SeqCst) >= 2, "expected several polls");
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        sub.cancel();
    }

    #[tokio::test]
    async fn fingerprint_transition_notifies_exactly_once() {
        let engine = PollingEngine::new(TICK);
        let version = Arc::new(AtomicU64::new(1));
        let fired = Arc::new(AtomicUsize::new(0));

        let sub = engine.subscribe(
            "events",
            versioned_fetcher(Arc::clone(&version), Arc::new(AtomicUsize::new(0))),
            counting_callback(Arc::clone(&fired)),
        );
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "first fetch only primes");

        version.store(2, Ordering::SeqCst);
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Stable again: no further notifications.
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        sub.cancel();
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_fingerprint() {
        let engine = PollingEngine::new(TICK);
        let fail = Arc::new(AtomicU64::new(0));
        let version = Arc::new(AtomicU64::new(1));
        let fired = Arc::new(AtomicUsize::new(0));

        let fetch: FingerprintFetcher = {
            let fail = Arc::clone(&fail);
            let version = Arc::clone(&version);
            Arc::new(move || {
                let fail = Arc::clone(&fail);
                let version = Arc::clone(&version);
                Box::pin(async move {
                    if fail.load(Ordering::SeqCst) == 1 {
                        Err(RemoteError::Status(503))
                    } else {
                        Ok(fingerprint_for(version.load(Ordering::SeqCst) as i64))
                    }
                })
            })
        };

        let sub = engine.subscribe("events", fetch, counting_callback(Arc::clone(&fired)));
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Outage while the data changes underneath.
        fail.store(1, Ordering::SeqCst);
        version.store(2, Ordering::SeqCst);
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "failures must not notify");

        // Recovery: the change made during the outage is detected.
        fail.store(0, Ordering::SeqCst);
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        sub.cancel();
    }

    #[tokio::test]
    async fn cancelling_last_subscription_stops_polling() {
        let engine = PollingEngine::new(TICK);
        let fetches = Arc::new(AtomicUsize::new(0));

        let sub = engine.subscribe(
            "reps",
            versioned_fetcher(Arc::new(AtomicU64::new(1)), Arc::clone(&fetches)),
            counting_callback(Arc::new(AtomicUsize::new(0))),
        );
        settle().await;
        sub.cancel();

        let after_cancel = fetches.load(Ordering::SeqCst);
        settle().await;
        assert_eq!(fetches.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test]
    async fn subscribers_on_one_topic_share_a_fetcher() {
        let engine = PollingEngine::new(TICK);
        let version = Arc::new(AtomicU64::new(1));
        let fired_a = Arc::new(AtomicUsize::new(0));
        let fired_b = Arc::new(AtomicUsize::new(0));

        let sub_a = engine.subscribe(
            "reps",
            versioned_fetcher(Arc::clone(&version), Arc::new(AtomicUsize::new(0))),
            counting_callback(Arc::clone(&fired_a)),
        );
        let sub_b = engine.subscribe(
            "reps",
            versioned_fetcher(Arc::clone(&version), Arc::new(AtomicUsize::new(0))),
            counting_callback(Arc::clone(&fired_b)),
        );
        settle().await;

        version.store(2, Ordering::SeqCst);
        settle().await;
        assert_eq!(fired_a.load(Ordering::SeqCst), 1);
        assert_eq!(fired_b.load(Ordering::SeqCst), 1);

        // Dropping one subscriber leaves the other live.
        sub_a.cancel();
        version.store(3, Ordering::SeqCst);
        settle().await;
        assert_eq!(fired_a.load(Ordering::SeqCst), 1);
        assert_eq!(fired_b.load(Ordering::SeqCst), 2);
        sub_b.cancel();
    }
}
