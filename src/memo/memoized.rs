//! Single-threaded memoized wrapper.

use std::marker::PhantomData;

use serde::Serialize;
use uuid::Uuid;

use crate::cache::{Cache, CacheStore};
use crate::digest::{CacheKey, Digester, DigestError};

/// A function wrapped with its own cache.
///
/// Built by [`memoize`](super::memoize) or [`Memoizer`](super::Memoizer).
/// The cache is owned by this value alone; memoizing the same function twice
/// gives two independent caches.
pub struct Memoized<A, R, E, F, S = Cache<R>> {
    id: Uuid,
    func: F,
    cache: S,
    digester: Digester,
    _marker: PhantomData<fn(A) -> Result<R, E>>,
}

impl<A, R, E, F, S> Memoized<A, R, E, F, S> {
    pub(crate) fn from_parts(func: F, cache: S, digester: Digester) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(memo = %id, "memoized wrapper created");
        Self {
            id,
            func,
            cache,
            digester,
            _marker: PhantomData,
        }
    }

    /// Identifier of this wrapper, as it appears in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The wrapper's cache, for inspection.
    pub fn cache(&self) -> &S {
        &self.cache
    }

    /// The wrapper's cache, for manual eviction.
    pub fn cache_mut(&mut self) -> &mut S {
        &mut self.cache
    }

    /// Consumes the wrapper, returning the function and its cache.
    pub fn into_parts(self) -> (F, S) {
        (self.func, self.cache)
    }
}

impl<A, R, E, F, S> Memoized<A, R, E, F, S>
where
    A: Serialize,
{
    /// The key a call with `args` would use.
    pub fn key_for(&self, args: &A) -> Result<CacheKey, DigestError> {
        self.digester.key(args)
    }
}

impl<A, R, E, F, S> Memoized<A, R, E, F, S>
where
    A: Serialize,
    R: Clone,
    E: From<DigestError>,
    F: FnMut(A) -> Result<R, E>,
    S: CacheStore<R>,
{
    /// Calls the wrapped function, answering from the cache when possible.
    ///
    /// Digest failures are converted into `E` before the function runs.
    /// Errors from the function are returned unchanged and never cached.
    pub fn call(&mut self, args: A) -> Result<R, E> {
        let key = self.digester.key(&args)?;

        if let Some(value) = self.cache.lookup(&key) {
            let value = value.clone();
            self.cache.on_hit(&key);
            tracing::trace!(memo = %self.id, key = key.short(), "cache hit");
            return Ok(value);
        }

        self.cache.on_miss(&key);
        tracing::trace!(memo = %self.id, key = key.short(), "cache miss");

        let value = (self.func)(args)?;
        self.cache.set(key, value.clone());
        Ok(value)
    }
}

impl<A, R, E, F, S: std::fmt::Debug> std::fmt::Debug for Memoized<A, R, E, F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("id", &self.id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
