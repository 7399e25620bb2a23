//! Memoized wrapper that can be shared between threads.

use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::cache::{Cache, CacheStore};
use crate::digest::{CacheKey, Digester, DigestError};

use super::gate::GateTable;

/// Thread-safe memoized wrapper.
///
/// Calls for the same key are serialized through a per-key gate, so the
/// wrapped function runs at most once at a time for any key. Callers that
/// wait on a gate re-check the cache before computing; if the computation
/// they waited on failed, the next one in line retries it.
pub struct SharedMemoized<A, R, E, F, S = Cache<R>> {
    id: Uuid,
    func: F,
    cache: Mutex<S>,
    in_flight: GateTable<Mutex<()>>,
    digester: Digester,
    _marker: PhantomData<fn(A) -> Result<R, E>>,
}

impl<A, R, E, F, S> SharedMemoized<A, R, E, F, S> {
    pub(crate) fn from_parts(func: F, cache: S, digester: Digester) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(memo = %id, "shared memoized wrapper created");
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
    /// Calls on this wrapper block while the guard is held.
    pub fn cache(&self) -> MutexGuard<'_, S> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of keys currently being computed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Consumes the wrapper, returning the function and its cache.
    pub fn into_parts(self) -> (F, S) {
        let cache = self.cache.into_inner().unwrap_or_else(PoisonError::into_inner);
        (self.func, cache)
    }
}

impl<A, R, E, F, S> SharedMemoized<A, R, E, F, S>
where
    A: Serialize,
{
    /// The key a call with `args` would use.
    pub fn key_for(&self, args: &A) -> Result<CacheKey, DigestError> {
        self.digester.key(args)
    }
}

impl<A, R, E, F, S> SharedMemoized<A, R, E, F, S>
where
    A: Serialize,
    R: Clone,
    E: From<DigestError>,
    F: Fn(A) -> Result<R, E>,
    S: CacheStore<R>,
{
    /// Calls the wrapped function, answering from the cache when possible.
    pub fn call(&self, args: A) -> Result<R, E> {
        let key = self.digester.key(&args)?;

        if let Some(value) = self.hit(&key) {
            return Ok(value);
        }

        let pass = self.in_flight.enter(&key);
        let _turn = pass.gate().lock().unwrap_or_else(PoisonError::into_inner);
        match self.hit(&key) {
            Some(value) => Ok(value),
            None => self.compute(&key, args),
        }
    }

    fn hit(&self, key: &CacheKey) -> Option<R> {
        let cache = self.cache();
        let value = cache.lookup(key)?.clone();
        cache.on_hit(key);
        tracing::trace!(memo = %self.id, key = key.short(), "cache hit");
        Some(value)
    }

    fn compute(&self, key: &CacheKey, args: A) -> Result<R, E> {
        self.cache().on_miss(key);
        tracing::trace!(memo = %self.id, key = key.short(), "cache miss");

        let value = (self.func)(args)?;
        self.cache().set(key.clone(), value.clone());
        Ok(value)
    }
}

impl<A, R, E, F, S: std::fmt::Debug> std::fmt::Debug for SharedMemoized<A, R, E, F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemoized")
            .field("id", &self.id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
