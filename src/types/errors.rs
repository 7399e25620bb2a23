//! Tipos de erro do memoize.

use thiserror::Error;

use crate::digest::{CacheKey, DigestError};

/// Tipo de resultado padrão do memoize.
pub type MemoResult<T> = Result<T, MemoError>;

/// Erros do cache, dos argumentos e da CLI.
///
/// Funções memoizadas podem usar `MemoError` como tipo de erro próprio: ele
/// converte de [`DigestError`], que é tudo o que um wrapper exige.
#[derive(Error, Debug)]
pub enum MemoError {
    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error("Chave não encontrada no cache: {0}")]
    KeyNotFound(CacheKey),

    #[error("Argumento inválido: {0}")]
    Argument(String),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl MemoError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de argumento.
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        Self::Argument(msg.into())
    }
}
