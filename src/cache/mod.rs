//! Armazenamento de cache dos wrappers memoizados.
//!
//! [`CacheStore`] é a interface de armazenamento; [`Cache`] é a implementação
//! padrão, com metadados por entrada e estatísticas de hit/miss. Nada é
//! removido automaticamente.

mod memory;
mod store;

pub use memory::{Cache, CacheEntry, CacheStats};
pub use store::CacheStore;
