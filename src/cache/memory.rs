//! Cache em memória com metadados por entrada e estatísticas de acerto.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use super::CacheStore;
use crate::digest::CacheKey;

/// Um valor em cache.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// O resultado armazenado.
    pub value: V,

    /// Quando o valor foi armazenado.
    pub cached_at: DateTime<Utc>,

    hits: AtomicU64,
}

impl<V> CacheEntry<V> {
    /// Cria uma entrada com o horário atual.
    pub fn new(value: V) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            hits: AtomicU64::new(0),
        }
    }

    /// Quantas chamadas esta entrada respondeu.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

/// Estatísticas do cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Número atual de entradas.
    pub size: usize,

    /// Número de cache hits.
    pub hits: u64,

    /// Número de cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Armazenamento padrão de um wrapper memoizado.
///
/// Entradas nunca são removidas sozinhas; use [`CacheStore::remove`],
/// [`retain`](Cache::retain) ou [`CacheStore::clear`].
#[derive(Debug)]
pub struct Cache<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> Cache<V> {
    /// Cria um cache vazio.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Entrada com seus metadados.
    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Itera sobre todas as entradas, sem ordem definida.
    pub fn entries(&self) -> impl Iterator<Item = (&CacheKey, &CacheEntry<V>)> {
        self.entries.iter()
    }

    /// Mantém apenas as entradas para as quais `keep` retorna true.
    pub fn retain<P>(&mut self, mut keep: P)
    where
        P: FnMut(&CacheKey, &CacheEntry<V>) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|key, entry| keep(key, entry));
        tracing::debug!(removed = before - self.entries.len(), "cache entries evicted");
    }

    /// Retorna estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> for Cache<V> {
    fn lookup(&self, key: &CacheKey) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    fn set(&mut self, key: CacheKey, value: V) {
        self.entries.insert(key, CacheEntry::new(value));
    }

    fn remove(&mut self, key: &CacheKey) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn on_hit(&self, key: &CacheKey) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if let Some(entry) = self.entries.get(key) {
            entry.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_miss(&self, _key: &CacheKey) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}
