//! Bounded, time-expiring content cache with single-flight loading.
//!
//! [`ContentCache`] maps a key to a value produced by an async loader. Entries
//! expire a fixed time after they were written (reads do not extend them), and
//! at most `max_entries` live at once with least-recently-used eviction.
//!
//! Concurrent callers asking for the same missing key share one load: the first
//! caller starts it, later callers wait on the same future and all receive the
//! same outcome. Failed loads are handed to every waiter but never stored, so the
//! next request retries.
//!
//! The state lock is only held for bookkeeping, never across a load.

use crate::{CacheConfig, Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Outcome of a load as seen by every caller waiting on it.
pub type LoadResult<V> = std::result::Result<V, Arc<Error>>;

type InFlight<V> = Shared<BoxFuture<'static, LoadResult<V>>>;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    written_at: Instant,
}

struct CacheState<V> {
    entries: LruCache<String, CacheEntry<V>>,
    in_flight: HashMap<String, InFlight<V>>,
}

#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSummary {
    /// Lookups answered from a fresh entry.
    pub hits: u64,
    /// Lookups that started a load.
    pub misses: u64,
    /// Lookups that joined a load already in flight.
    pub coalesced: u64,
    /// Loads that completed successfully.
    pub loads: u64,
    /// Loads that failed (not cached).
    pub load_failures: u64,
    /// Entries dropped because they outlived the TTL.
    pub expirations: u64,
    /// Entries dropped to respect the capacity bound.
    pub evictions: u64,
    /// Live entries, including ones that expired but were not looked up yet.
    pub entries: usize,
}

/// Time-expiring LRU cache with per-key single-flight loads.
pub struct ContentCache<V> {
    inner: Arc<Inner<V>>,
}

struct Inner<V> {
    state: Mutex<CacheState<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl<V> ContentCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache using the system clock.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with a custom time source.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.max_entries)
            .ok_or_else(|| Error::Config("cache.max_entries must be at least 1".into()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CacheState {
                    entries: LruCache::new(capacity),
                    in_flight: HashMap::new(),
                }),
                ttl: config.ttl(),
                clock,
                stats: CacheStats::default(),
            }),
        })
    }

    /// Return the fresh value for `key`, loading it with `loader` if needed.
    ///
    /// `loader` is only invoked when no fresh entry exists and no load for
    /// `key` is already running. A started load runs to completion on its own
    /// task even if every caller waiting on it goes away, so this must be
    /// called from within a Tokio runtime.
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> LoadResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let inner = &self.inner;
        let flight = {
            let mut state = inner.state.lock().await;
            let now = inner.clock.now();

            let fresh = state
                .entries
                .get(key)
                .filter(|entry| inner.is_fresh(entry, now))
                .map(|entry| entry.value.clone());
            if let Some(value) = fresh {
                inner.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "content cache hit");
                return Ok(value);
            }
            if state.entries.pop(key).is_some() {
                inner.stats.expirations.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "content cache entry expired");
            }

            if let Some(flight) = state.in_flight.get(key) {
                inner.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "joining in-flight load");
                flight.clone()
            } else {
                inner.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "content cache miss");
                let flight = loader().map(|result| result.map_err(Arc::new)).boxed().shared();
                state.in_flight.insert(key.to_string(), flight.clone());
                inner.drive(key.to_string(), flight.clone());
                flight
            }
        };

        let result = flight.clone().await;
        inner.settle(key, &flight, &result).await;
        result
    }

    /// Drop the entry for `key`. Returns whether one was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.inner.state.lock().await.entries.pop(key).is_some()
    }

    /// Drop every entry. Loads already in flight are not affected.
    pub async fn clear(&self) {
        self.inner.state.lock().await.entries.clear();
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.entries.len()
    }

    /// Whether no entries are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the cache counters.
    pub async fn stats(&self) -> CacheStatsSummary {
        let entries = self.len().await;
        let stats = &self.inner.stats;
        CacheStatsSummary {
            hits: stats.hits.load(Ordering::Relaxed),
            misses: stats.misses.load(Ordering::Relaxed),
            coalesced: stats.coalesced.load(Ordering::Relaxed),
            loads: stats.loads.load(Ordering::Relaxed),
            load_failures: stats.load_failures.load(Ordering::Relaxed),
            expirations: stats.expirations.load(Ordering::Relaxed),
            evictions: stats.evictions.load(Ordering::Relaxed),
            entries,
        }
    }

    #[cfg(test)]
    async fn in_flight_len(&self) -> usize {
        self.inner.state.lock().await.in_flight.len()
    }
}

impl<V> Inner<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.written_at) < self.ttl
    }

    /// Record the outcome of `flight` exactly once, whichever waiter gets here first.
    async fn settle(&self, key: &str, flight: &InFlight<V>, result: &LoadResult<V>) {
        let mut state = self.state.lock().await;
        let current = state
            .in_flight
            .get(key)
            .is_some_and(|running| running.ptr_eq(flight));
        if !current {
            return;
        }
        state.in_flight.remove(key);

        match result {
            Ok(value) => {
                self.stats.loads.fetch_add(1, Ordering::Relaxed);
                let entry = CacheEntry {
                    value: value.clone(),
                    written_at: self.clock.now(),
                };
                if let Some((evicted, _)) = state.entries.push(key.to_string(), entry) {
                    if evicted != key {
                        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %evicted, "evicted least recently used entry");
                    }
                }
            },
            Err(err) => {
                self.stats.load_failures.fetch_add(1, Ordering::Relaxed);
                debug!(%key, error = %err, "load failed; nothing cached");
            },
        }
    }

    /// Poll `flight` on its own task and record the outcome, so an abandoned
    /// load still finishes and leaves the in-flight table.
    fn drive(self: &Arc<Self>, key: String, flight: InFlight<V>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = flight.clone().await;
            inner.settle(&key, &flight, &result).await;
        });
    }
}
