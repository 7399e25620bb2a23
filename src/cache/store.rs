//! Storage seam between a memoized wrapper and its entries.

use std::collections::HashMap;

use crate::digest::CacheKey;
use crate::{MemoError, MemoResult};

/// Key/value storage owned by one memoized wrapper.
///
/// Only `lookup`, `set`, `remove`, `keys`, `clear` and `len` are required;
/// the rest have default implementations in terms of them.
pub trait CacheStore<V> {
    /// Returns the stored value, if any.
    fn lookup(&self, key: &CacheKey) -> Option<&V>;

    /// Stores or overwrites the value for `key`.
    fn set(&mut self, key: CacheKey, value: V);

    /// Removes an entry, returning its value.
    fn remove(&mut self, key: &CacheKey) -> Option<V>;

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<CacheKey>;

    /// Removes every entry.
    fn clear(&mut self);

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Returns the stored value or [`MemoError::KeyNotFound`].
    fn get(&self, key: &CacheKey) -> MemoResult<&V> {
        self.lookup(key)
            .ok_or_else(|| MemoError::KeyNotFound(key.clone()))
    }

    /// True iff `key` has a stored value.
    fn has_key(&self, key: &CacheKey) -> bool {
        self.lookup(key).is_some()
    }

    /// True iff the store has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Called by wrappers when a call is answered from the store.
    fn on_hit(&self, _key: &CacheKey) {}

    /// Called by wrappers when a call has to compute its value.
    fn on_miss(&self, _key: &CacheKey) {}
}

impl<V> CacheStore<V> for HashMap<CacheKey, V> {
    fn lookup(&self, key: &CacheKey) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn set(&mut self, key: CacheKey, value: V) {
        self.insert(key, value);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<V> {
        HashMap::remove(self, key)
    }

    fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = HashMap::keys(self).cloned().collect();
        keys.sort();
        keys
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::cache_key;

    #[test]
    fn test_hashmap_store() {
        let mut store: HashMap<CacheKey, i32> = HashMap::new();
        let key = cache_key(&1).unwrap();

        assert!(!store.has_key(&key));
        assert!(matches!(
            CacheStore::get(&store, &key),
            Err(MemoError::KeyNotFound(_))
        ));

        store.set(key.clone(), 10);
        assert!(store.has_key(&key));
        assert_eq!(*CacheStore::get(&store, &key).unwrap(), 10);

        store.set(key.clone(), 11);
        assert_eq!(CacheStore::len(&store), 1);
        assert_eq!(CacheStore::remove(&mut store, &key), Some(11));
        assert!(CacheStore::is_empty(&store));
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut store: HashMap<CacheKey, i32> = HashMap::new();
        for i in 0..10 {
            store.set(cache_key(&i).unwrap(), i);
        }

        let keys = CacheStore::keys(&store);
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 10);
    }
}
