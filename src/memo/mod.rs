//! Memoized wrappers and the factory that builds them.
//!
//! - [`Memoized`] - single-threaded wrapper, `call(&mut self, ..)`
//! - [`SharedMemoized`] - thread-safe wrapper with one computation per key in flight
//! - [`AsyncMemoized`] - same discipline for functions returning futures
//!
//! ```
//! use memoize::{memoize, CacheStore, MemoError};
//!
//! let mut square = memoize(|x: i64| -> Result<i64, MemoError> { Ok(x * x) });
//! assert_eq!(square.call(3).unwrap(), 9);
//! assert_eq!(square.call(3).unwrap(), 9);
//! assert_eq!(square.cache().len(), 1);
//! ```

mod async_memo;
mod gate;
mod memoized;
mod shared;

pub use async_memo::AsyncMemoized;
pub use memoized::Memoized;
pub use shared::SharedMemoized;

use std::future::Future;

use serde::Serialize;

use crate::cache::{Cache, CacheStore};
use crate::digest::{DigestError, Digester};
use crate::types::config::{Config, DigestConfig};

/// Factory for memoized wrappers sharing one key derivation setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Memoizer {
    digester: Digester,
}

impl Memoizer {
    /// Creates a factory with the given digest limits.
    pub fn new(config: DigestConfig) -> Self {
        Self {
            digester: Digester::new(config),
        }
    }

    /// Creates a factory from the `[digest]` section of a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.digest)
    }

    /// The digester used by every wrapper built here.
    pub fn digester(&self) -> Digester {
        self.digester
    }

    /// Wraps a fallible function.
    pub fn wrap<A, R, E, F>(&self, func: F) -> Memoized<A, R, E, F>
    where
        A: Serialize,
        R: Clone,
        E: From<DigestError>,
        F: FnMut(A) -> Result<R, E>,
    {
        Memoized::from_parts(func, Cache::new(), self.digester)
    }

    /// Wraps an infallible function. Only digest failures can surface.
    pub fn wrap_pure<A, R, F>(
        &self,
        mut func: F,
    ) -> Memoized<A, R, DigestError, impl FnMut(A) -> Result<R, DigestError>>
    where
        A: Serialize,
        R: Clone,
        F: FnMut(A) -> R,
    {
        self.wrap(move |args| Ok(func(args)))
    }

    /// Wraps a fallible function over a caller-supplied store.
    pub fn wrap_with_store<A, R, E, F, S>(&self, func: F, store: S) -> Memoized<A, R, E, F, S>
    where
        A: Serialize,
        R: Clone,
        E: From<DigestError>,
        F: FnMut(A) -> Result<R, E>,
        S: CacheStore<R>,
    {
        Memoized::from_parts(func, store, self.digester)
    }

    /// Wraps a function for use from several threads.
    pub fn wrap_shared<A, R, E, F>(&self, func: F) -> SharedMemoized<A, R, E, F>
    where
        A: Serialize,
        R: Clone,
        E: From<DigestError>,
        F: Fn(A) -> Result<R, E>,
    {
        SharedMemoized::from_parts(func, Cache::new(), self.digester)
    }

    /// Wraps an async function.
    pub fn wrap_async<A, R, E, F, Fut>(&self, func: F) -> AsyncMemoized<A, R, E, F>
    where
        A: Serialize,
        R: Clone,
        E: From<DigestError>,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        AsyncMemoized::from_parts(func, Cache::new(), self.digester)
    }
}

/// Wraps a fallible function with a fresh cache.
///
/// `func` is not called until the wrapper is.
pub fn memoize<A, R, E, F>(func: F) -> Memoized<A, R, E, F>
where
    A: Serialize,
    R: Clone,
    E: From<DigestError>,
    F: FnMut(A) -> Result<R, E>,
{
    Memoizer::default().wrap(func)
}

/// Wraps an infallible function with a fresh cache.
pub fn memoize_pure<A, R, F>(
    func: F,
) -> Memoized<A, R, DigestError, impl FnMut(A) -> Result<R, DigestError>>
where
    A: Serialize,
    R: Clone,
    F: FnMut(A) -> R,
{
    Memoizer::default().wrap_pure(func)
}
