//! # memoize
//!
//! Transparent memoization of arbitrary functions.
//!
//! A wrapped function keeps its calling convention: it takes the same
//! argument value and returns the same `Result`. Each call derives a cache
//! key from a canonical SHA-256 digest of the arguments; a hit returns the
//! stored value, a miss runs the function and stores its successful result.
//! Failures are never cached.
//!
//! ## Modules
//!
//! - [`digest`] - Canonical argument encoding and cache keys
//! - [`cache`] - Cache storage and inspection
//! - [`memo`] - Memoized wrappers and the [`Memoizer`] factory
//! - [`cli`] - Command line interface
//! - [`types`] - Configuration and errors

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod digest;
pub mod memo;
pub mod types;

pub use cache::{Cache, CacheEntry, CacheStats, CacheStore};
pub use digest::{cache_key, ArgList, CacheKey, DigestError, Digester};
pub use memo::{memoize, memoize_pure, AsyncMemoized, Memoized, Memoizer, SharedMemoized};
pub use types::config::Config;
pub use types::errors::{MemoError, MemoResult};
