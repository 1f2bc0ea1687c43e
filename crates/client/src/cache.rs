//! Keyed query cache with in-flight deduplication and pattern invalidation.
//!
//! [`QueryCache`] is an explicit store created once per session and shared by
//! cloning (it is a handle around `Arc` state). Values of any type are
//! stored per [`QueryKey`].
//!
//! # Freshness
//!
//! An entry is served by [`QueryCache::get_or_fetch`] only while it is fresh:
//! not invalidated and younger than the configured TTL. Otherwise the next
//! `get_or_fetch` refetches. [`QueryCache::peek`] still returns stale values,
//! flagged as such, so a view can keep showing them while the refetch runs.
//!
//! # Deduplication
//!
//! Concurrent `get_or_fetch` calls for one key share a single fetch. The
//! fetch runs as a spawned task and stores its own result, so it completes
//! even if every caller goes away. A fetch that was in flight when its key
//! was invalidated is detached: later callers start a new fetch, and the old
//! result is only kept (as stale) if nothing newer exists.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{broadcast, Mutex};

use campus_core::query::{KeyPattern, QueryKey};

use crate::error::ApiError;

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, ApiError>>>;

/// Buffer of the cache event channel.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of stored keys. Least recently used entries are
    /// evicted beyond this.
    pub capacity: usize,
    /// Age after which an entry is stale.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl: Duration::from_secs(300),
        }
    }
}

/// Notifications published on every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Entries matching `pattern` were marked stale; fresher data will
    /// follow on the next read.
    Invalidated { pattern: KeyPattern, matched: usize },
    Fetched { key: QueryKey },
    FetchFailed { key: QueryKey, error: String },
    Evicted { key: QueryKey },
}

/// A cached value and whether it is stale.
#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    pub stale: bool,
}

struct Entry {
    value: AnyValue,
    fetched_at: Instant,
    invalidated: bool,
    last_used: u64,
}

struct InFlight {
    id: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    in_flight: HashMap<QueryKey, InFlight>,
    tick: u64,
    next_fetch_id: u64,
}

impl CacheState {
    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

#[derive(Clone)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
    events: broadcast::Sender<CacheEvent>,
    config: CacheConfig,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            events,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: CacheEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.fetched_at.elapsed() >= self.config.ttl
    }

    /// Return the fresh cached value for `key`, or fetch it.
    ///
    /// `fetch` is only called when no fresh value exists and no fetch for
    /// the key is already in flight.
    pub async fn get_or_fetch<V, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<V>, ApiError>
    where
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let shared = {
            let mut state = self.state.lock().await;
            let tick = state.touch();

            if let Some(entry) = state.entries.get_mut(&key) {
                if !entry.invalidated && entry.fetched_at.elapsed() < self.config.ttl {
                    if let Ok(value) = entry.value.clone().downcast::<V>() {
                        entry.last_used = tick;
                        tracing::debug!(%key, "Cache hit");
                        return Ok(value);
                    }
                }
            }

            let joined = state.in_flight.get(&key).map(|f| f.future.clone());
            match joined {
                Some(future) => {
                    tracing::debug!(%key, "Joining in-flight fetch");
                    future
                }
                None => {
                    tracing::debug!(%key, "Cache miss, fetching");
                    state.next_fetch_id += 1;
                    let id = state.next_fetch_id;
                    let future = self.spawn_fetch(key.clone(), id, fetch());
                    state.in_flight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            future: future.clone(),
                        },
                    );
                    future
                }
            }
        };

        let value = shared.await?;
        value
            .downcast::<V>()
            .map_err(|_| ApiError::Decode(format!("cached value for {key} has an unexpected type")))
    }

    fn spawn_fetch<V, Fut>(&self, key: QueryKey, id: u64, fut: Fut) -> SharedFetch
    where
        V: Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        let handle = tokio::spawn(async move {
            let result = fut.await.map(|v| Arc::new(v) as AnyValue);
            cache.complete(key, id, &result).await;
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Transport(format!("fetch task failed: {e}"))))
        }
        .boxed()
        .shared()
    }

    /// Record the outcome of fetch `id` for `key`.
    async fn complete(&self, key: QueryKey, id: u64, result: &Result<AnyValue, ApiError>) {
        let mut evicted = Vec::new();
        {
            let mut state = self.state.lock().await;
            let current = state.in_flight.get(&key).is_some_and(|f| f.id == id);
            if current {
                state.in_flight.remove(&key);
            }

            // A fetch detached by invalidation only fills an empty slot.
            if let Ok(value) = result {
                if current || !state.entries.contains_key(&key) {
                    let tick = state.touch();
                    state.entries.insert(
                        key.clone(),
                        Entry {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                            invalidated: !current,
                            last_used: tick,
                        },
                    );
                    evicted = self.evict(&mut state);
                }
            }
        }

        match result {
            Ok(_) => self.publish(CacheEvent::Fetched { key }),
            Err(e) => {
                tracing::debug!(%key, error = %e, "Fetch failed");
                self.publish(CacheEvent::FetchFailed {
                    key,
                    error: e.to_string(),
                });
            }
        }
        for key in evicted {
            self.publish(CacheEvent::Evicted { key });
        }
    }

    fn evict(&self, state: &mut CacheState) -> Vec<QueryKey> {
        let capacity = self.config.capacity.max(1);
        let mut evicted = Vec::new();
        while state.entries.len() > capacity {
            let Some(oldest) = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            state.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "Evicted cache entry");
            evicted.push(oldest);
        }
        evicted
    }

    /// Store a value as fresh.
    pub async fn set<V: Send + Sync + 'static>(&self, key: QueryKey, value: V) {
        let evicted = {
            let mut state = self.state.lock().await;
            let tick = state.touch();
            state.entries.insert(
                key,
                Entry {
                    value: Arc::new(value),
                    fetched_at: Instant::now(),
                    invalidated: false,
                    last_used: tick,
                },
            );
            self.evict(&mut state)
        };
        for key in evicted {
            self.publish(CacheEvent::Evicted { key });
        }
    }

    /// The cached value for `key`, fresh or stale, without fetching.
    pub async fn peek<V: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Cached<V>> {
        let state = self.state.lock().await;
        let entry = state.entries.get(key)?;
        let value = entry.value.clone().downcast::<V>().ok()?;
        Some(Cached {
            value,
            stale: entry.invalidated || self.is_expired(entry),
        })
    }

    /// Mark every entry matching `pattern` stale and detach matching
    /// in-flight fetches. Returns the number of keys affected. Repeating
    /// the call has no further effect.
    pub async fn invalidate(&self, pattern: &KeyPattern) -> usize {
        let matched = {
            let mut state = self.state.lock().await;
            let mut matched = 0;
            for (key, entry) in state.entries.iter_mut() {
                if pattern.matches(key) {
                    entry.invalidated = true;
                    matched += 1;
                }
            }
            let before = state.in_flight.len();
            state.in_flight.retain(|key, _| !pattern.matches(key));
            matched + (before - state.in_flight.len())
        };

        tracing::info!(?pattern, matched, "Invalidated cache entries");
        self.publish(CacheEvent::Invalidated {
            pattern: pattern.clone(),
            matched,
        });
        matched
    }

    /// Drop every entry, e.g. on logout.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.in_flight.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.state.lock().await.entries.contains_key(key)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::models::EntityKind;
    use campus_core::pagination::PageCursor;

    fn dept_page(page: u32) -> QueryKey {
        QueryKey::collection(EntityKind::Department, None, PageCursor::new(page, 10))
    }

    #[tokio::test]
    async fn hit_after_fetch() {
        let cache = QueryCache::default();
        let v = cache
            .get_or_fetch(dept_page(1), || async { Ok::<_, ApiError>(41u32) })
            .await
            .unwrap();
        assert_eq!(*v, 41);

        let v = cache
            .get_or_fetch(dept_page(1), || async { Ok::<_, ApiError>(99u32) })
            .await
            .unwrap();
        assert_eq!(*v, 41);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache = QueryCache::default();
        let err = cache
            .get_or_fetch(dept_page(1), || async { Err::<u32, _>(ApiError::Timeout) })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout);
        assert!(!cache.contains(&dept_page(1)).await);
    }

    #[tokio::test]
    async fn peek_reports_staleness_after_invalidation() {
        let cache = QueryCache::default();
        cache.set(dept_page(1), "page one".to_string()).await;

        let fresh = cache.peek::<String>(&dept_page(1)).await.unwrap();
        assert!(!fresh.stale);

        cache.invalidate(&KeyPattern::Kind(EntityKind::Department)).await;
        let stale = cache.peek::<String>(&dept_page(1)).await.unwrap();
        assert!(stale.stale);
        assert_eq!(*stale.value, "page one");
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let cache = QueryCache::new(CacheConfig {
            capacity: 8,
            ttl: Duration::ZERO,
        });
        cache.set(dept_page(1), 1u32).await;
        let v = cache
            .get_or_fetch(dept_page(1), || async { Ok::<_, ApiError>(2u32) })
            .await
            .unwrap();
        assert_eq!(*v, 2);
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let cache = QueryCache::new(CacheConfig {
            capacity: 2,
            ttl: Duration::from_secs(60),
        });
        let mut events = cache.subscribe();

        cache.set(dept_page(1), 1u32).await;
        cache.set(dept_page(2), 2u32).await;
        // Touch page 1 so page 2 becomes the oldest.
        cache
            .get_or_fetch(dept_page(1), || async { Ok::<_, ApiError>(0u32) })
            .await
            .unwrap();
        cache.set(dept_page(3), 3u32).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.contains(&dept_page(1)).await);
        assert!(!cache.contains(&dept_page(2)).await);
        assert_eq!(
            events.recv().await.unwrap(),
            CacheEvent::Evicted { key: dept_page(2) }
        );
    }
}
