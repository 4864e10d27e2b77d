use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::error::{MealError, Result};

use super::key::QueryKey;
use super::retry::{with_retries, RetryPolicy};

/// Failure shared by every caller waiting on the same fetch.
#[derive(Debug, Clone)]
struct FetchFailure {
    attempts: u32,
    error: Arc<MealError>,
}

type SharedFetch<V> = Shared<BoxFuture<'static, std::result::Result<V, FetchFailure>>>;

struct Entry<V> {
    value: V,
    fetched_at: Instant,
    last_used: Instant,
}

struct InFlight<V> {
    id: u64,
    fetch: SharedFetch<V>,
}

struct State<V> {
    entries: LruCache<QueryKey, Entry<V>>,
    in_flight: HashMap<QueryKey, InFlight<V>>,
    /// Bumped on every invalidation of a namespace. A fetch that started
    /// under an older generation must not populate the cache.
    generations: HashMap<&'static str, u64>,
    next_fetch_id: u64,
}

impl<V> State<V> {
    fn generation(&self, namespace: &str) -> u64 {
        self.generations.get(namespace).copied().unwrap_or(0)
    }
}

struct Inner<V> {
    state: Mutex<State<V>>,
    stale_time: Duration,
    retention_time: Duration,
    retry: RetryPolicy,
}

impl<V> Inner<V> {
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keyed read cache in front of the store.
///
/// Results are served without a store round trip while younger than the
/// stale time, and dropped once unused for the retention time. Concurrent
/// misses on one key share a single store request, and transport failures
/// are retried with exponential backoff before surfacing as
/// [`MealError::DataUnavailable`].
pub struct QueryCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_settings(
            config.stale_time(),
            config.retention_time(),
            config.capacity,
            RetryPolicy::new(config.read_retries, config.retry_base()),
        )
    }

    pub fn with_settings(
        stale_time: Duration,
        retention_time: Duration,
        capacity: usize,
        retry: RetryPolicy,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries: LruCache::new(capacity),
                    in_flight: HashMap::new(),
                    generations: HashMap::new(),
                    next_fetch_id: 0,
                }),
                stale_time,
                retention_time,
                retry,
            }),
        }
    }

    /// Return the cached value for `key` if fresh, otherwise run `fetch`
    /// (joining an identical request already in flight).
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> Result<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = {
            let mut state = self.inner.lock();
            let now = Instant::now();

            if let Some(value) = self.fresh_value(&mut state, &key, now) {
                tracing::trace!(key = %key, "cache hit");
                return Ok(value);
            }

            match state.in_flight.get(&key) {
                Some(in_flight) => {
                    tracing::debug!(key = %key, "joining in-flight fetch");
                    in_flight.fetch.clone()
                }
                None => {
                    let id = state.next_fetch_id;
                    state.next_fetch_id += 1;
                    let generation = state.generation(key.namespace());
                    let pending = self.start_fetch(key.clone(), id, generation, fetch);
                    state.in_flight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            fetch: pending.clone(),
                        },
                    );
                    pending
                }
            }
        };

        pending
            .await
            .map_err(|failure| MealError::DataUnavailable {
                attempts: failure.attempts,
                source: failure.error,
            })
    }

    fn fresh_value(&self, state: &mut State<V>, key: &QueryKey, now: Instant) -> Option<V> {
        let entry = state.entries.get_mut(key)?;
        if now.duration_since(entry.last_used) >= self.inner.retention_time {
            state.entries.pop(key);
            return None;
        }
        entry.last_used = now;
        if now.duration_since(entry.fetched_at) < self.inner.stale_time {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn start_fetch<F, Fut>(
        &self,
        key: QueryKey,
        id: u64,
        generation: u64,
        fetch: F,
    ) -> SharedFetch<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        async move {
            let op = key.namespace();
            let outcome = with_retries(&inner.retry, op, || fetch()).await;

            let mut state = inner.lock();
            if state.in_flight.get(&key).map(|f| f.id) == Some(id) {
                state.in_flight.remove(&key);
            }

            match outcome {
                Ok(value) => {
                    if state.generation(key.namespace()) == generation {
                        let now = Instant::now();
                        state.entries.put(
                            key,
                            Entry {
                                value: value.clone(),
                                fetched_at: now,
                                last_used: now,
                            },
                        );
                    } else {
                        tracing::debug!(key = %key, "invalidated during fetch, not caching");
                    }
                    Ok(value)
                }
                Err(failure) => {
                    tracing::error!(
                        key = %key,
                        attempts = failure.attempts,
                        error = %failure.error,
                        "store read failed"
                    );
                    Err(FetchFailure {
                        attempts: failure.attempts,
                        error: Arc::new(failure.error),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Drop every cached and in-flight result in `namespace`.
    ///
    /// The next read of any key in the namespace goes to the store.
    pub fn invalidate_namespace(&self, namespace: &'static str) -> usize {
        let mut state = self.inner.lock();
        *state.generations.entry(namespace).or_insert(0) += 1;
        state.in_flight.retain(|key, _| key.namespace() != namespace);

        let doomed: Vec<QueryKey> = state
            .entries
            .iter()
            .filter(|(key, _)| key.namespace() == namespace)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            state.entries.pop(key);
        }

        tracing::debug!(namespace, removed = doomed.len(), "invalidated cache namespace");
        doomed.len()
    }

    /// Remove entries unused for longer than the retention time.
    pub fn evict_expired(&self) -> usize {
        let mut state = self.inner.lock();
        let now = Instant::now();
        let retention = self.inner.retention_time;

        let expired: Vec<QueryKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_used) >= retention)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.entries.pop(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::{MEALS_NAMESPACE, WEEKLY_MEMOS_NAMESPACE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    fn cache() -> QueryCache<Vec<u32>> {
        QueryCache::with_settings(
            Duration::from_secs(300),
            Duration::from_secs(1800),
            16,
            RetryPolicy::new(3, Duration::from_millis(1000)),
        )
    }

    fn key(param: &str) -> QueryKey {
        QueryKey::new(MEALS_NAMESPACE, vec![param.to_string()])
    }

    fn counting(
        calls: &Arc<AtomicUsize>,
        value: Vec<u32>,
    ) -> impl Fn() -> BoxFuture<'static, Result<Vec<u32>>> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let value = value.clone();
            async move { Ok(value) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entries_skip_the_store() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_fetch(key("a"), counting(&calls, vec![1])).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get_or_fetch(key("a"), counting(&calls, vec![2])).await.unwrap();

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entries_are_refetched() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_fetch(key("a"), counting(&calls, vec![1])).await.unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;
        let value = cache.get_or_fetch(key("a"), counting(&calls, vec![2])).await.unwrap();

        assert_eq!(value, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unused_entries_expire_after_retention() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_fetch(key("a"), counting(&calls, vec![1])).await.unwrap();
        tokio::time::advance(Duration::from_secs(1000)).await;
        cache.get_or_fetch(key("b"), counting(&calls, vec![2])).await.unwrap();
        assert_eq!(cache.len(), 2);

        tokio::time::advance(Duration::from_secs(800)).await;
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_is_scoped_to_namespace() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let memo_key = QueryKey::new(WEEKLY_MEMOS_NAMESPACE, vec!["w".to_string()]);

        cache.get_or_fetch(key("a"), counting(&calls, vec![1])).await.unwrap();
        cache.get_or_fetch(key("b"), counting(&calls, vec![1])).await.unwrap();
        cache.get_or_fetch(memo_key.clone(), counting(&calls, vec![9])).await.unwrap();

        assert_eq!(cache.invalidate_namespace(MEALS_NAMESPACE), 2);
        assert_eq!(cache.len(), 1);

        let refreshed = cache.get_or_fetch(key("a"), counting(&calls, vec![5])).await.unwrap();
        let memo = cache.get_or_fetch(memo_key, counting(&calls, vec![0])).await.unwrap();
        assert_eq!(refreshed, vec![5]);
        assert_eq!(memo, vec![9]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_request() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        let fetch = {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let gate = Arc::clone(&gate);
                async move {
                    gate.acquire().await.unwrap().forget();
                    Ok(vec![7])
                }
                .boxed()
            }
        };
        let fetch = Arc::new(fetch);

        let mut handles = Vec::new();
        for _ in 0..3 {
            let cache = cache.clone();
            let fetch = Arc::clone(&fetch);
            handles.push(tokio::spawn(async move {
                cache.get_or_fetch(key("a"), move || fetch()).await
            }));
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        gate.add_permits(1);

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec![7]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let value = cache
            .get_or_fetch(key("a"), move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(MealError::Timeout(10))
                    } else {
                        Ok(vec![3])
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_data_unavailable() {
        let cache = cache();

        let err = cache
            .get_or_fetch(key("a"), || async { Err(MealError::Timeout(10)) })
            .await
            .unwrap_err();

        match err {
            MealError::DataUnavailable { attempts, source } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*source, MealError::Timeout(10)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_is_not_cached() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        let slow = {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let gate = Arc::clone(&gate);
                async move {
                    gate.acquire().await.unwrap().forget();
                    Ok(vec![1])
                }
            }
        };

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_fetch(key("a"), slow).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        cache.invalidate_namespace(MEALS_NAMESPACE);
        gate.add_permits(1);

        assert_eq!(pending.await.unwrap().unwrap(), vec![1]);
        assert!(cache.is_empty());

        let fresh = cache.get_or_fetch(key("a"), counting(&calls, vec![2])).await.unwrap();
        assert_eq!(fresh, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = QueryCache::with_settings(
            Duration::from_secs(300),
            Duration::from_secs(1800),
            2,
            RetryPolicy::none(),
        );
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_fetch(key("a"), counting(&calls, vec![1])).await.unwrap();
        cache.get_or_fetch(key("b"), counting(&calls, vec![2])).await.unwrap();
        cache.get_or_fetch(key("a"), counting(&calls, vec![1])).await.unwrap();
        cache.get_or_fetch(key("c"), counting(&calls, vec![3])).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.get_or_fetch(key("b"), counting(&calls, vec![2])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
