//! Per-key gates for the concurrent wrappers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::digest::CacheKey;

struct Slot<G> {
    gate: Arc<G>,
    holders: usize,
}

/// Table of gates for keys with a call in progress.
///
/// A slot lives exactly as long as some caller holds a [`Pass`] for its key.
pub(crate) struct GateTable<G> {
    slots: Mutex<HashMap<CacheKey, Slot<G>>>,
}

impl<G> GateTable<G> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys with at least one caller inside.
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot<G>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<G: Default> GateTable<G> {
    /// Registers a caller for `key` and hands back the key's gate.
    pub(crate) fn enter<'a>(&'a self, key: &'a CacheKey) -> Pass<'a, G> {
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            gate: Arc::default(),
            holders: 0,
        });
        slot.holders += 1;
        Pass {
            table: self,
            key,
            gate: slot.gate.clone(),
        }
    }
}

/// A caller's registration in a [`GateTable`].
///
/// Dropping it, on return, unwind or future cancellation, removes the slot
/// once no other caller holds one for the same key.
pub(crate) struct Pass<'a, G> {
    table: &'a GateTable<G>,
    key: &'a CacheKey,
    gate: Arc<G>,
}

impl<G> Pass<'_, G> {
    pub(crate) fn gate(&self) -> &G {
        &self.gate
    }
}

impl<G> Drop for Pass<'_, G> {
    fn drop(&mut self) {
        let mut slots = self.table.lock();
        if let Some(slot) = slots.get_mut(self.key) {
            slot.holders -= 1;
            if slot.holders == 0 {
                slots.remove(self.key);
            }
        }
    }
}
