//! Dynamic argument lists for functions of variable arity.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::encoder::{Discard, Encoder};
use super::DigestError;
use crate::{MemoError, MemoResult};

/// Ordered positional arguments plus named arguments.
///
/// Named arguments are kept sorted by name, so the order in which they are
/// supplied never changes the cache key; renaming one always does.
///
/// ```
/// use memoize::digest::{cache_key, ArgList};
///
/// let a = ArgList::new().with_arg(2).unwrap().with_named("scale", 1.5).unwrap();
/// let b = ArgList::new().with_named("scale", 1.5).unwrap().with_arg(2).unwrap();
/// assert_eq!(cache_key(&a).unwrap(), cache_key(&b).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgList {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl ArgList {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn push_arg<T: Serialize>(&mut self, value: T) -> Result<(), DigestError> {
        self.positional.push(to_json(&value)?);
        Ok(())
    }

    /// Adds a named argument. A name may be given only once.
    pub fn insert_named<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> Result<(), DigestError> {
        let name = name.into();
        if self.named.contains_key(&name) {
            return Err(DigestError::DuplicateArgument(name));
        }
        let value = to_json(&value)?;
        self.named.insert(name, value);
        Ok(())
    }

    /// Builder form of [`push_arg`](Self::push_arg).
    pub fn with_arg<T: Serialize>(mut self, value: T) -> Result<Self, DigestError> {
        self.push_arg(value)?;
        Ok(self)
    }

    /// Builder form of [`insert_named`](Self::insert_named).
    pub fn with_named<T: Serialize>(
        mut self,
        name: impl Into<String>,
        value: T,
    ) -> Result<Self, DigestError> {
        self.insert_named(name, value)?;
        Ok(self)
    }

    /// Positional argument `index`, converted to `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> MemoResult<T> {
        let value = self
            .positional
            .get(index)
            .ok_or_else(|| MemoError::argument(format!("missing positional argument {index}")))?;
        T::deserialize(value)
            .map_err(|e| MemoError::argument(format!("positional argument {index}: {e}")))
    }

    /// Named argument `name`, converted to `T`.
    pub fn get_named<T: DeserializeOwned>(&self, name: &str) -> MemoResult<T> {
        let value = self
            .named
            .get(name)
            .ok_or_else(|| MemoError::argument(format!("missing named argument '{name}'")))?;
        T::deserialize(value)
            .map_err(|e| MemoError::argument(format!("named argument '{name}': {e}")))
    }

    /// Raw positional values.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Raw named values, sorted by name.
    pub fn named(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    /// Total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// True iff there are no positional and no named arguments.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, DigestError> {
    // serde_json turns NaN and infinities into null; refuse them up front.
    value.serialize(&mut Encoder::new(Discard, usize::MAX).reject_non_finite())?;
    serde_json::to_value(value).map_err(|e| DigestError::Unsupported(e.to_string()))
}
