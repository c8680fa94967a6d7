//! Read-through cache accessor with stale-while-revalidate reads.
//!
//! A read returns the cached snapshot immediately and refreshes it from the
//! backend in the background. When the refresh lands, the snapshot is
//! overwritten wholesale and the fresh collection is pushed to subscribers, so
//! screens re-render from the event instead of fetching again.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::cache::{keys, DurableCache};
use crate::gateway::{GatewayResult, RemoteGateway};
use crate::models::{PicklistTeam, PitScoutingEntry, ScoutingEntry};
use crate::observer::{Observers, Subscription};

/// Boxed fetch future returned by `RemoteCollection::fetch_all`.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<Vec<T>>> + Send>>;

/// A backend collection mirrored in the local cache.
pub trait RemoteCollection:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Cache key of the snapshot
    const CACHE_KEY: &'static str;
    /// Name used in log lines
    const LABEL: &'static str;

    /// Fetch the whole collection from the backend
    fn fetch_all(gateway: Arc<dyn RemoteGateway>) -> FetchFuture<Self>;
}

impl RemoteCollection for ScoutingEntry {
    const CACHE_KEY: &'static str = keys::ENTRIES_CACHE;
    const LABEL: &'static str = "entries";

    fn fetch_all(gateway: Arc<dyn RemoteGateway>) -> FetchFuture<Self> {
        Box::pin(async move { gateway.fetch_entries().await })
    }
}

impl RemoteCollection for PitScoutingEntry {
    const CACHE_KEY: &'static str = keys::PIT_CACHE;
    const LABEL: &'static str = "pit entries";

    fn fetch_all(gateway: Arc<dyn RemoteGateway>) -> FetchFuture<Self> {
        Box::pin(async move { gateway.fetch_pit_entries().await })
    }
}

impl RemoteCollection for PicklistTeam {
    const CACHE_KEY: &'static str = keys::PICKLIST_CACHE;
    const LABEL: &'static str = "picklist";

    fn fetch_all(gateway: Arc<dyn RemoteGateway>) -> FetchFuture<Self> {
        Box::pin(async move { gateway.fetch_picklist().await })
    }
}

struct Inner<C: RemoteCollection> {
    gateway: Arc<dyn RemoteGateway>,
    cache: DurableCache,
    observers: Observers<Vec<C>>,
    write_lock: Mutex<()>,
}

/// Stale-while-revalidate view of one remote collection.
pub struct ReadThroughCache<C: RemoteCollection> {
    inner: Arc<Inner<C>>,
}

impl<C: RemoteCollection> Clone for ReadThroughCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: RemoteCollection> std::fmt::Debug for ReadThroughCache<C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ReadThroughCache")
            .field("collection", &C::LABEL)
            .finish_non_exhaustive()
    }
}

impl<C: RemoteCollection> ReadThroughCache<C> {
    pub fn new(gateway: Arc<dyn RemoteGateway>, cache: DurableCache) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                cache,
                observers: Observers::new(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Last persisted snapshot, without touching the network
    pub fn snapshot(&self) -> Option<Vec<C>> {
        self.inner.cache.load(C::CACHE_KEY)
    }

    /// Serve the collection.
    ///
    /// With a non-empty snapshot this returns at once and refreshes in the
    /// background. Otherwise it waits for the backend; a failed fetch yields
    /// whatever (empty) snapshot exists instead of an error.
    pub async fn get(&self) -> Vec<C> {
        self.get_tracked().await.0
    }

    /// Like `get`, also returning the handle of the background refresh, if one was started.
    pub async fn get_tracked(&self) -> (Vec<C>, Option<JoinHandle<()>>) {
        let cached = self.snapshot().unwrap_or_default();
        if !cached.is_empty() {
            return (cached, self.spawn_refresh());
        }
        let fresh = self.refresh().await.unwrap_or(cached);
        (fresh, None)
    }

    /// Fetch from the backend and overwrite the snapshot.
    ///
    /// Returns `None` on failure; the snapshot is left untouched and the error
    /// only reaches the log.
    pub async fn refresh(&self) -> Option<Vec<C>> {
        match C::fetch_all(Arc::clone(&self.inner.gateway)).await {
            Ok(fresh) => {
                self.replace(fresh.clone()).await;
                Some(fresh)
            }
            Err(error) => {
                tracing::warn!(collection = C::LABEL, "Background refresh failed: {error}");
                None
            }
        }
    }

    /// Overwrite the snapshot and broadcast it.
    pub async fn replace(&self, collection: Vec<C>) {
        let _guard = self.inner.write_lock.lock().await;
        self.inner.cache.store(C::CACHE_KEY, &collection);
        self.inner.observers.notify(&collection);
    }

    /// Apply a local change to the snapshot, persist it, and broadcast it.
    pub async fn modify(&self, change: impl FnOnce(&mut Vec<C>)) -> Vec<C> {
        let _guard = self.inner.write_lock.lock().await;
        let mut collection = self.snapshot().unwrap_or_default();
        change(&mut collection);
        self.inner.cache.store(C::CACHE_KEY, &collection);
        self.inner.observers.notify(&collection);
        collection
    }

    /// Receive every collection written to the snapshot from now on.
    pub fn subscribe(&self, callback: impl Fn(&Vec<C>) + Send + Sync + 'static) -> Subscription {
        self.inner.observers.subscribe(callback)
    }

    fn spawn_refresh(&self) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(
                collection = C::LABEL,
                "No async runtime; serving cached snapshot without refresh"
            );
            return None;
        };
        let this = self.clone();
        Some(runtime.spawn(async move {
            this.refresh().await;
        }))
    }
}
