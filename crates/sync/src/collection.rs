//! The generic resilient collection accessor.
//!
//! One [`ResilientCollection`] serves a single entity collection through the
//! availability fallback chain: remote store first, last-known-good cache
//! when the remote is unreachable, bundled defaults when the cache has never
//! been written. Mutations attempted while offline are applied to the local
//! snapshot and recorded in the pending-changes log.
//!
//! Unavailability is remembered for the rest of the session: after the first
//! failed call every operation goes straight to the local snapshot, and the
//! remote store is not contacted again until [`ResilientCollection::resync`]
//! succeeds. Wire `resync` to a change-feed notification or a periodic
//! background task.
//!
//! Domain errors (validation, conflict, not-found) are never subject to
//! fallback; only transport failures and 5xx responses are.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use repatlas_core::error::CoreError;
use repatlas_core::types::DbId;
use repatlas_db::models::{
    CreateEvent, CreateRepresentative, Event, EventCategory, Representative,
};

use crate::cache::{CacheError, CacheStore, PendingChange, PendingKind};
use crate::remote::{RemoteError, RemoteStore};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("No locally cached {collection} row with id {id}")]
    NotCached { collection: String, id: DbId },
}

/// An entity that can live in a resilient collection.
pub trait CollectionEntity:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    fn id(&self) -> DbId;
}

impl CollectionEntity for Representative {
    fn id(&self) -> DbId {
        self.id
    }
}

impl CollectionEntity for Event {
    fn id(&self) -> DbId {
        self.id
    }
}

impl CollectionEntity for EventCategory {
    fn id(&self) -> DbId {
        self.id
    }
}

/// Remote side of a collection. [`HttpCollection`] is the production
/// implementation; tests script their own.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    type Entity: CollectionEntity;
    type Draft: Serialize + Send + Sync;

    /// Collection name, also the cache slot key.
    fn name(&self) -> &str;

    /// Client-side validation, run before any dispatch so bad input fails
    /// fast instead of entering the fallback chain.
    fn validate(&self, _draft: &Self::Draft) -> Result<(), CoreError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Self::Entity>, RemoteError>;
    async fn get(&self, id: DbId) -> Result<Option<Self::Entity>, RemoteError>;
    async fn create(&self, draft: &Self::Draft) -> Result<Self::Entity, RemoteError>;
    async fn update(&self, id: DbId, draft: &Self::Draft) -> Result<Self::Entity, RemoteError>;
    async fn delete(&self, id: DbId) -> Result<Self::Entity, RemoteError>;
    async fn reset(&self) -> Result<Vec<Self::Entity>, RemoteError>;
}

/// REST-backed collection over a [`RemoteStore`].
pub struct HttpCollection<E, D> {
    store: RemoteStore,
    name: &'static str,
    path: &'static str,
    /// Collection-level `/reset` action, where the API offers one.
    reset_path: Option<&'static str>,
    validate: fn(&D) -> Result<(), CoreError>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, D> HttpCollection<E, D> {
    pub fn new(
        store: RemoteStore,
        name: &'static str,
        path: &'static str,
        reset_path: Option<&'static str>,
        validate: fn(&D) -> Result<(), CoreError>,
    ) -> Self {
        Self {
            store,
            name,
            path,
            reset_path,
            validate,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, D> RemoteCollection for HttpCollection<E, D>
where
    E: CollectionEntity,
    D: Serialize + Send + Sync,
{
    type Entity = E;
    type Draft = D;

    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, draft: &D) -> Result<(), CoreError> {
        (self.validate)(draft)
    }

    async fn list(&self) -> Result<Vec<E>, RemoteError> {
        self.store.list(self.path).await
    }

    async fn get(&self, id: DbId) -> Result<Option<E>, RemoteError> {
        self.store.get(self.path, id).await
    }

    async fn create(&self, draft: &D) -> Result<E, RemoteError> {
        self.store.create(self.path, draft).await
    }

    async fn update(&self, id: DbId, draft: &D) -> Result<E, RemoteError> {
        self.store.update(self.path, id, draft).await
    }

    async fn delete(&self, id: DbId) -> Result<E, RemoteError> {
        self.store.delete(self.path, id).await
    }

    async fn reset(&self) -> Result<Vec<E>, RemoteError> {
        match self.reset_path {
            Some(path) => self.store.post_action(path).await,
            None => Err(RemoteError::NotFound),
        }
    }
}

/// The representatives collection against the hosted API.
pub fn representatives(
    store: RemoteStore,
) -> HttpCollection<Representative, CreateRepresentative> {
    HttpCollection::new(
        store,
        "representatives",
        "/representatives",
        Some("/representatives/reset"),
        CreateRepresentative::validate,
    )
}

/// The events collection against the hosted API.
pub fn events(store: RemoteStore) -> HttpCollection<Event, CreateEvent> {
    HttpCollection::new(store, "events", "/events", None, CreateEvent::validate)
}

/// The representatives collection wired through the fallback chain, with the
/// bundled default roster as the offline floor.
pub fn representatives_collection(
    store: RemoteStore,
    cache: CacheStore,
) -> ResilientCollection<HttpCollection<Representative, CreateRepresentative>> {
    ResilientCollection::new(
        representatives(store),
        cache,
        repatlas_db::seed::default_representative_entities(),
    )
}

/// The events collection wired through the fallback chain. There is no
/// bundled default event list; offline with no cache means an empty calendar.
pub fn events_collection(
    store: RemoteStore,
    cache: CacheStore,
) -> ResilientCollection<HttpCollection<Event, CreateEvent>> {
    ResilientCollection::new(events(store), cache, Vec::new())
}

/// A collection accessor wired through the fallback chain.
pub struct ResilientCollection<R: RemoteCollection> {
    remote: R,
    cache: CacheStore,
    defaults: Vec<R::Entity>,
    /// Session-scoped availability memo. Once set, every operation serves
    /// the local snapshot directly; only a successful [`Self::resync`]
    /// clears it.
    remote_down: AtomicBool,
}

impl<R: RemoteCollection> ResilientCollection<R> {
    pub fn new(remote: R, cache: CacheStore, defaults: Vec<R::Entity>) -> Self {
        Self {
            remote,
            cache,
            defaults,
            remote_down: AtomicBool::new(false),
        }
    }

    fn is_down(&self) -> bool {
        self.remote_down.load(Ordering::SeqCst)
    }

    fn mark_down(&self) {
        self.remote_down.store(true, Ordering::SeqCst);
    }

    /// List the collection: remote, then cache, then bundled defaults.
    /// Every successful remote read refreshes the cache mirror. A known-down
    /// remote is not contacted again.
    pub async fn list(&self) -> Result<Vec<R::Entity>, SyncError> {
        if self.is_down() {
            return self.local_items();
        }
        match self.remote.list().await {
            Ok(items) => {
                self.mirror(&items);
                Ok(items)
            }
            Err(err) if err.is_unavailable() => {
                warn!(
                    collection = self.remote.name(),
                    error = %err,
                    "Remote store unavailable; serving local data"
                );
                self.mark_down();
                self.local_items()
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch one row. Falls back to the local snapshot when the remote store
    /// is unavailable; a missing row is `Ok(None)` either way.
    pub async fn get(&self, id: DbId) -> Result<Option<R::Entity>, SyncError> {
        if self.is_down() {
            return Ok(self.local_items()?.into_iter().find(|item| item.id() == id));
        }
        match self.remote.get(id).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_unavailable() => {
                self.mark_down();
                let items = self.local_items()?;
                Ok(items.into_iter().find(|item| item.id() == id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create a row. Validation runs before dispatch; offline creates are
    /// applied to the local snapshot under a synthetic id and logged.
    pub async fn create(&self, draft: R::Draft) -> Result<R::Entity, SyncError> {
        self.remote.validate(&draft)?;
        if self.is_down() {
            return self.create_offline(&draft);
        }
        match self.remote.create(&draft).await {
            Ok(entity) => {
                let mut items = self.local_items()?;
                items.push(entity.clone());
                self.mirror(&items);
                Ok(entity)
            }
            Err(err) if err.is_unavailable() => {
                warn!(
                    collection = self.remote.name(),
                    error = %err,
                    "Remote store unavailable; queueing create locally"
                );
                self.mark_down();
                self.create_offline(&draft)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replace a row. Offline updates rewrite the cached row in place,
    /// keeping its original creation time.
    pub async fn update(&self, id: DbId, draft: R::Draft) -> Result<R::Entity, SyncError> {
        self.remote.validate(&draft)?;
        if self.is_down() {
            return self.update_offline(id, &draft);
        }
        match self.remote.update(id, &draft).await {
            Ok(entity) => {
                let mut items = self.local_items()?;
                if let Some(slot) = items.iter_mut().find(|item| item.id() == id) {
                    *slot = entity.clone();
                }
                self.mirror(&items);
                Ok(entity)
            }
            Err(err) if err.is_unavailable() => {
                warn!(
                    collection = self.remote.name(),
                    error = %err,
                    "Remote store unavailable; queueing update locally"
                );
                self.mark_down();
                self.update_offline(id, &draft)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a row, returning the removed entity.
    pub async fn delete(&self, id: DbId) -> Result<R::Entity, SyncError> {
        if self.is_down() {
            return self.delete_offline(id);
        }
        match self.remote.delete(id).await {
            Ok(entity) => {
                let mut items = self.local_items()?;
                items.retain(|item| item.id() != id);
                self.mirror(&items);
                Ok(entity)
            }
            Err(err) if err.is_unavailable() => {
                warn!(
                    collection = self.remote.name(),
                    error = %err,
                    "Remote store unavailable; queueing delete locally"
                );
                self.mark_down();
                self.delete_offline(id)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Discard the collection and restore the bundled defaults, remotely when
    /// reachable, locally otherwise. Clears the pending log either way.
    pub async fn reset(&self) -> Result<Vec<R::Entity>, SyncError> {
        let items = if self.is_down() {
            self.defaults.clone()
        } else {
            match self.remote.reset().await {
                Ok(items) => items,
                Err(err) if err.is_unavailable() => {
                    warn!(
                        collection = self.remote.name(),
                        error = %err,
                        "Remote store unavailable; resetting local snapshot only"
                    );
                    self.mark_down();
                    self.defaults.clone()
                }
                Err(err) => return Err(err.into()),
            }
        };
        self.cache.store(self.remote.name(), &items)?;
        self.cache.clear_pending(self.remote.name())?;
        Ok(items)
    }

    /// Re-attempt the remote store. On success the availability memo is
    /// cleared and the cache mirror refreshed; ordinary reads pick up the
    /// remote again from there. This is the hook for change-feed events and
    /// background refresh timers.
    pub async fn resync(&self) -> Result<Vec<R::Entity>, SyncError> {
        match self.remote.list().await {
            Ok(items) => {
                self.remote_down.store(false, Ordering::SeqCst);
                self.mirror(&items);
                Ok(items)
            }
            Err(err) => {
                if err.is_unavailable() {
                    self.mark_down();
                }
                Err(err.into())
            }
        }
    }

    /// Mutations recorded while the remote store was unreachable, in
    /// application order.
    pub fn pending(&self) -> Result<Vec<PendingChange>, SyncError> {
        Ok(self.cache.pending(self.remote.name())?)
    }

    /// Best-effort cache mirror; a failed write never fails the read that
    /// produced it.
    fn mirror(&self, items: &[R::Entity]) {
        if let Err(err) = self.cache.store(self.remote.name(), items) {
            warn!(
                collection = self.remote.name(),
                error = %err,
                "Failed to mirror into local cache"
            );
        }
    }

    /// The local snapshot: cache slot if one was ever written, otherwise the
    /// bundled defaults (which also bootstrap the cache).
    fn local_items(&self) -> Result<Vec<R::Entity>, SyncError> {
        match self.cache.load::<R::Entity>(self.remote.name())? {
            Some(slot) => Ok(slot.items),
            None => {
                self.cache.store(self.remote.name(), &self.defaults)?;
                Ok(self.defaults.clone())
            }
        }
    }

    fn create_offline(&self, draft: &R::Draft) -> Result<R::Entity, SyncError> {
        let now = Utc::now();
        // Millisecond clock as the synthetic id, safely clear of sequence ids.
        let id = now.timestamp_millis();
        let mut value = serde_json::to_value(draft).map_err(CacheError::Corrupt)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("id".into(), json!(id));
            map.insert("createdAt".into(), json!(now));
            map.insert("updatedAt".into(), json!(now));
        }
        let entity: R::Entity =
            serde_json::from_value(value.clone()).map_err(CacheError::Corrupt)?;

        let mut items = self.local_items()?;
        items.push(entity.clone());
        self.cache.store(self.remote.name(), &items)?;
        self.cache.append_pending(
            self.remote.name(),
            PendingChange::new(PendingKind::Create, id, Some(value)),
        )?;
        Ok(entity)
    }

    fn update_offline(&self, id: DbId, draft: &R::Draft) -> Result<R::Entity, SyncError> {
        let mut items = self.local_items()?;
        let Some(index) = items.iter().position(|item| item.id() == id) else {
            return Err(SyncError::NotCached {
                collection: self.remote.name().to_string(),
                id,
            });
        };

        let now = Utc::now();
        let previous = serde_json::to_value(&items[index]).map_err(CacheError::Corrupt)?;
        let mut value = serde_json::to_value(draft).map_err(CacheError::Corrupt)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("id".into(), json!(id));
            map.insert(
                "createdAt".into(),
                previous.get("createdAt").cloned().unwrap_or(json!(now)),
            );
            map.insert("updatedAt".into(), json!(now));
        }
        let entity: R::Entity =
            serde_json::from_value(value.clone()).map_err(CacheError::Corrupt)?;

        items[index] = entity.clone();
        self.cache.store(self.remote.name(), &items)?;
        self.cache.append_pending(
            self.remote.name(),
            PendingChange::new(PendingKind::Update, id, Some(value)),
        )?;
        Ok(entity)
    }

    fn delete_offline(&self, id: DbId) -> Result<R::Entity, SyncError> {
        let mut items = self.local_items()?;
        let Some(index) = items.iter().position(|item| item.id() == id) else {
            return Err(SyncError::NotCached {
                collection: self.remote.name().to_string(),
                id,
            });
        };
        let removed = items.remove(index);
        self.cache.store(self.remote.name(), &items)?;
        self.cache.append_pending(
            self.remote.name(),
            PendingChange::new(PendingKind::Delete, id, None),
        )?;
        Ok(removed)
    }
}
