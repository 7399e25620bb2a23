//! Cache key derivation.
//!
//! An argument value is serialized through serde into a canonical,
//! type-tagged byte stream and hashed with SHA-256. The key depends only on
//! the logical value of the arguments, never on addresses or on the
//! iteration order of maps.

mod args;
mod encoder;
mod error;
mod key;

pub use args::ArgList;
pub use error::DigestError;
pub use key::{cache_key, CacheKey, Digester};
