//! Memoized wrapper for async functions.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::cache::{Cache, CacheStore};
use crate::digest::{CacheKey, Digester, DigestError};

use super::gate::GateTable;

/// Memoized wrapper around a function returning a future.
///
/// Concurrent calls for the same key wait on a per-key async gate, so the
/// wrapped future is polled for at most one call per key at a time. No lock
/// is held across an `.await` other than the gate itself.
pub struct AsyncMemoized<A, R, E, F, S = Cache<R>> {
    id: Uuid,
    func: F,
    cache: Mutex<S>,
    in_flight: GateTable<tokio::sync::Mutex<()>>,
    digester: Digester,
    _marker: PhantomData<fn(A) -> Result<R, E>>,
}

impl<A, R, E, F, S> AsyncMemoized<A, R, E, F, S> {
    pub(crate) fn from_parts(func: F, cache: S, digester: Digester) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(memo = %id, "async memoized wrapper created");
        Self {
            id,
            func,
            cache: Mutex::new(cache),
            in_flight: GateTable::new(),
            digester,
            _marker: PhantomData,
        }
    }

    /// Identifier of this wrapper, as it appears in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Locks the cache for inspection or manual eviction.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn cache(&self) -> MutexGuard<'_, S> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of keys currently being computed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl<A, R, E, F, S> AsyncMemoized<A, R, E, F, S>
where
    A: Serialize,
{
    /// The key a call with `args` would use.
    pub fn key_for(&self, args: &A) -> Result<CacheKey, DigestError> {
        self.digester.key(args)
    }
}

impl<A, R, E, F, S> AsyncMemoized<A, R, E, F, S>
where
    A: Serialize,
    R: Clone,
    E: From<DigestError>,
    S: CacheStore<R>,
{
    /// Calls the wrapped function, answering from the cache when possible.
    pub async fn call<Fut>(&self, args: A) -> Result<R, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let key = self.digester.key(&args)?;

        if let Some(value) = self.hit(&key) {
            return Ok(value);
        }

        let pass = self.in_flight.enter(&key);
        let _turn = pass.gate().lock().await;
        match self.hit(&key) {
            Some(value) => Ok(value),
            None => self.compute(&key, args).await,
        }
    }

    fn hit(&self, key: &CacheKey) -> Option<R> {
        let cache = self.cache();
        let value = cache.lookup(key)?.clone();
        cache.on_hit(key);
        tracing::trace!(memo = %self.id, key = key.short(), "cache hit");
        Some(value)
    }

    async fn compute<Fut>(&self, key: &CacheKey, args: A) -> Result<R, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.cache().on_miss(key);
        tracing::trace!(memo = %self.id, key = key.short(), "cache miss");

        let value = (self.func)(args).await?;
        self.cache().set(key.clone(), value.clone());
        Ok(value)
    }
}

impl<A, R, E, F, S: std::fmt::Debug> std::fmt::Debug for AsyncMemoized<A, R, E, F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncMemoized")
            .field("id", &self.id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::Memoizer;
    use crate::MemoError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_computation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = Memoizer::default().wrap_async(move |id: u32| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, MemoError>(format!("record-{id}"))
            }
        });

        let (a, b, c) = tokio::join!(fetch.call(1), fetch.call(1), fetch.call(1));

        assert_eq!(a.unwrap(), "record-1");
        assert_eq!(b.unwrap(), "record-1");
        assert_eq!(c.unwrap(), "record-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetch.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_async_failure_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let checked = Memoizer::default().wrap_async(move |x: i32| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if x < 0 {
                    Err(MemoError::argument("negative input"))
                } else {
                    Ok(x)
                }
            }
        });

        assert!(checked.call(-1).await.is_err());
        assert!(checked.call(-1).await.is_err());
        assert_eq!(checked.call(4).await.unwrap(), 4);
        assert_eq!(checked.call(4).await.unwrap(), 4);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(checked.cache().len(), 1);
    }

    #[test]
    fn test_block_on() {
        let doubled = Memoizer::default()
            .wrap_async(|x: u64| async move { Ok::<_, MemoError>(x * 2) });

        let value = tokio_test::block_on(doubled.call(21)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(doubled.cache().stats().misses, 1);
    }

    #[tokio::test]
    async fn test_cancelled_call_releases_its_gate() {
        let stalled = Memoizer::default().wrap_async(|x: u32| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, MemoError>(x)
        });

        let outcome = tokio::time::timeout(Duration::from_millis(20), stalled.call(5)).await;

        assert!(outcome.is_err());
        assert_eq!(stalled.in_flight(), 0);
        assert!(stalled.cache().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gates_released_after_concurrent_rounds() {
        let double = Arc::new(Memoizer::default().wrap_async(|x: u32| async move {
            tokio::task::yield_now().await;
            Ok::<_, MemoError>(x * 2)
        }));

        for round in 0..300u32 {
            let callers: Vec<_> = (0..4)
                .map(|_| {
                    let double = double.clone();
                    tokio::spawn(async move { double.call(round).await })
                })
                .collect();
            for caller in callers {
                assert_eq!(caller.await.unwrap().unwrap(), round * 2);
            }
            assert_eq!(double.in_flight(), 0, "gate left behind in round {round}");
        }
        assert_eq!(double.cache().len(), 300);
    }
}
