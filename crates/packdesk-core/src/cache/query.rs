use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CachedData, QueryKey};

/// How long a cached value is served without refreshing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Staleness {
    /// Stale as soon as it is stored: every read triggers a refresh.
    #[default]
    Immediately,
    /// Fresh for the given window after each successful fetch.
    After(Duration),
    /// Never goes stale on its own; only invalidation refreshes it.
    Never,
}

impl Staleness {
    pub fn minutes(minutes: u64) -> Self {
        Staleness::After(Duration::from_secs(minutes * 60))
    }
}

#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The fetch failed. Shared by every caller that was waiting on it.
    #[error("{0:#}")]
    Fetch(Arc<anyhow::Error>),

    #[error("Cached value for {key} has an unexpected shape: {message}")]
    Decode { key: String, message: String },
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value, CacheError>>>;

struct Entry {
    cached: CachedData<Value>,
    updated_at: Instant,
    invalidated: bool,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            cached: CachedData::new(value),
            updated_at: Instant::now(),
            invalidated: false,
        }
    }

    fn is_stale(&self, staleness: Staleness) -> bool {
        if self.invalidated {
            return true;
        }
        match staleness {
            Staleness::Immediately => true,
            Staleness::After(window) => self.updated_at.elapsed() > window,
            Staleness::Never => false,
        }
    }
}

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

/// Per-key state. `generation` is bumped on every invalidation so a fetch
/// started earlier cannot store its result as fresh.
#[derive(Default)]
struct Slot {
    entry: Option<Entry>,
    in_flight: Option<InFlight>,
    generation: u64,
}

type Slots = HashMap<QueryKey, Slot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    StaleWhileRevalidate,
    Fresh,
}

enum Plan {
    Hit(Value),
    Revalidate(Value),
    Wait(SharedFetch),
}

/// Keyed cache of backend query results.
///
/// Construct one per session and pass it by handle; clones share state.
#[derive(Clone, Default)]
pub struct QueryCache {
    slots: Arc<Mutex<Slots>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // A panic while holding the lock cannot leave a slot half-written
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read `key`, fetching it when absent.
    ///
    /// - fresh entry: returned without a call
    /// - stale entry: returned immediately, one background refresh is started
    ///   unless one is already running
    /// - absent entry: waits for the fetch, joining one already in flight
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, staleness: Staleness, fetcher: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.read(key, staleness, ReadMode::StaleWhileRevalidate, fetcher).await
    }

    /// Like `fetch`, but a stale or invalidated entry is refreshed before
    /// returning instead of being served as-is.
    pub async fn fetch_fresh<T, F, Fut>(&self, key: &QueryKey, staleness: Staleness, fetcher: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.read(key, staleness, ReadMode::Fresh, fetcher).await
    }

    async fn read<T, F, Fut>(&self, key: &QueryKey, staleness: Staleness, mode: ReadMode, fetcher: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let plan = {
            let mut slots = self.lock();
            let slot = slots.entry(key.clone()).or_default();

            match slot.entry.as_ref() {
                Some(entry) if !entry.is_stale(staleness) => Plan::Hit(entry.cached.data.clone()),
                Some(entry) if mode == ReadMode::StaleWhileRevalidate => {
                    let value = entry.cached.data.clone();
                    if slot.in_flight.is_none() {
                        let _ = self.start_fetch(slot, key, fetcher);
                    }
                    Plan::Revalidate(value)
                }
                _ => {
                    let future = match slot.in_flight.as_ref() {
                        Some(in_flight) => in_flight.future.clone(),
                        None => self.start_fetch(slot, key, fetcher),
                    };
                    Plan::Wait(future)
                }
            }
        };

        match plan {
            Plan::Hit(value) => {
                debug!(key = %key, "Query cache hit");
                decode(key, value)
            }
            Plan::Revalidate(value) => {
                debug!(key = %key, "Serving stale value");
                decode(key, value)
            }
            Plan::Wait(future) => {
                debug!(key = %key, "Waiting for fetch");
                decode(key, future.await?)
            }
        }
    }

    /// Register a new fetch for `slot` and start driving it. The fetch runs
    /// to completion even if every caller waiting on it goes away. The
    /// caller holds the lock.
    fn start_fetch<T, F, Fut>(&self, slot: &mut Slot, key: &QueryKey, fetcher: F) -> SharedFetch
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        debug!(key = %key, "Starting fetch");
        let generation = slot.generation;
        let slots = Arc::clone(&self.slots);
        let key = key.clone();
        let request = fetcher();

        let future = async move {
            let result = match request.await {
                Ok(data) => serde_json::to_value(data).map_err(|e| CacheError::Decode {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
                Err(e) => Err(CacheError::Fetch(Arc::new(e))),
            };
            complete(&slots, &key, generation, &result);
            result
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });
        // Failures are logged by `complete` and keep the old value
        tokio::spawn(future.clone().map(|_| ()));
        future
    }

    /// The cached value for `key`, without fetching. Stale values are returned.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = {
            let slots = self.lock();
            slots.get(key)?.entry.as_ref()?.cached.data.clone()
        };
        match decode(key, value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring undecodable cache entry");
                None
            }
        }
    }

    /// Store `data` under `key` as freshly fetched.
    pub fn set_data<T: Serialize>(&self, key: &QueryKey, data: &T) -> Result<(), CacheError> {
        let value = serde_json::to_value(data).map_err(|e| CacheError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_default();
        slot.entry = Some(Entry::new(value));
        Ok(())
    }

    /// Human-readable age of the cached value for `key`.
    pub fn age_display(&self, key: &QueryKey) -> Option<String> {
        let slots = self.lock();
        slots.get(key)?.entry.as_ref().map(|e| e.cached.age_display())
    }

    /// Mark every entry whose key starts with `prefix` as stale. Cached
    /// values are kept; fetches already running for those keys are detached
    /// so the next read starts a new one. Returns the number of keys touched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut slots = self.lock();
        let mut touched = 0;
        for (key, slot) in slots.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
            debug!(key = %key, "Invalidating query");
            invalidate_slot(slot);
            touched += 1;
        }
        touched
    }

    /// Mark exactly `key` as stale.
    pub fn invalidate_exact(&self, key: &QueryKey) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(key) {
            Some(slot) => {
                debug!(key = %key, "Invalidating query");
                invalidate_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(prefix));
        before - slots.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a fetch for `key` is currently registered.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock().get(key).is_some_and(|slot| slot.in_flight.is_some())
    }
}

fn invalidate_slot(slot: &mut Slot) {
    slot.generation += 1;
    slot.in_flight = None;
    if let Some(entry) = slot.entry.as_mut() {
        entry.invalidated = true;
    }
}

/// Record the outcome of a fetch started at `generation`.
fn complete(slots: &Mutex<Slots>, key: &QueryKey, generation: u64, result: &Result<Value, CacheError>) {
    let mut slots = slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let Some(slot) = slots.get_mut(key) else {
        debug!(key = %key, "Query removed while fetching, discarding result");
        return;
    };

    if slot.in_flight.as_ref().is_some_and(|f| f.generation == generation) {
        slot.in_flight = None;
    }
    if slot.generation != generation {
        debug!(key = %key, "Query invalidated while fetching, discarding result");
        return;
    }

    match result {
        Ok(value) => slot.entry = Some(Entry::new(value.clone())),
        Err(e) => warn!(key = %key, error = %e, "Fetch failed, keeping previous value"),
    }
}

fn decode<T: DeserializeOwned>(key: &QueryKey, value: Value) -> Result<T, CacheError> {
    serde_json::from_value(value).map_err(|e| CacheError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}
