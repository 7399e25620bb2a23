//! Key derivation errors.

use std::fmt::Display;

use thiserror::Error;

/// An argument value could not be turned into a cache key.
///
/// The wrapped function is never invoked when this is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The value's `Serialize` implementation reported an error.
    #[error("argument cannot be serialized for hashing: {0}")]
    Unsupported(String),

    /// The value nests deeper than the configured limit.
    #[error("argument nesting depth {depth} exceeds limit {limit}")]
    DepthExceeded { depth: usize, limit: usize },

    /// The same named argument was given twice.
    #[error("duplicate named argument: {0}")]
    DuplicateArgument(String),

    /// NaN or an infinity was placed in an [`ArgList`](super::ArgList).
    #[error("non-finite float has no JSON representation")]
    NonFiniteFloat,
}

impl serde::ser::Error for DigestError {
    fn custom<T: Display>(msg: T) -> Self {
        DigestError::Unsupported(msg.to_string())
    }
}
