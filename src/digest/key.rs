//! Cache keys: SHA-256 over the canonical encoding of an argument value.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::encoder::Encoder;
use super::DigestError;
use crate::types::config::DigestConfig;

/// Hex-encoded SHA-256 digest identifying one argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an existing hex digest, e.g. one printed by `memoize key`.
    pub fn from_digest_hex<S: Into<String>>(hex: S) -> Self {
        Self(hex.into())
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Derives cache keys from argument values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digester {
    max_depth: usize,
}

impl Digester {
    /// Creates a digester with the given limits.
    pub fn new(config: DigestConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    /// Maximum nesting depth accepted.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Computes the cache key of `value`.
    pub fn key<T: ?Sized + Serialize>(&self, value: &T) -> Result<CacheKey, DigestError> {
        let mut encoder = Encoder::new(Sha256::new(), self.max_depth);
        value.serialize(&mut encoder)?;
        Ok(CacheKey(hex::encode(encoder.into_sink().finalize())))
    }

    /// The canonical byte encoding that [`key`](Self::key) hashes.
    pub fn canonical_bytes<T: ?Sized + Serialize>(&self, value: &T) -> Result<Vec<u8>, DigestError> {
        let mut encoder = Encoder::new(Vec::new(), self.max_depth);
        value.serialize(&mut encoder)?;
        Ok(encoder.into_sink())
    }
}

impl Default for Digester {
    fn default() -> Self {
        Self::new(DigestConfig::default())
    }
}

/// Computes the cache key of `value` with default limits.
pub fn cache_key<T: ?Sized + Serialize>(value: &T) -> Result<CacheKey, DigestError> {
    Digester::default().key(value)
}
