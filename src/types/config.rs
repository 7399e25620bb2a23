//! Configuração do memoize.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::MemoResult;

/// Nome padrão do arquivo de configuração.
pub const CONFIG_FILE: &str = "memoize.toml";

/// Configuração principal do memoize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configurações gerais.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Configurações de derivação de chaves.
    #[serde(default)]
    pub digest: DigestConfig,

    /// Configurações do comando `demo`.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Configurações gerais.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Nível de log (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Formato de log (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Configurações de derivação de chaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Profundidade máxima de aninhamento de um argumento.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    128
}

/// Configurações do comando `demo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Lado da matriz quadrada usada no cenário de tempo.
    #[serde(default = "default_matrix_size")]
    pub matrix_size: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            matrix_size: default_matrix_size(),
        }
    }
}

fn default_matrix_size() -> usize {
    1000
}

impl Config {
    /// Carrega configuração de um arquivo TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> MemoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Salva configuração em um arquivo TOML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MemoResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Cria configuração padrão.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            digest: DigestConfig::default(),
            demo: DemoConfig::default(),
        }
    }

    /// Carrega configuração de `path`, ou usa a padrão se o arquivo não existe.
    ///
    /// Um arquivo existente mas inválido é um erro.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> MemoResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default_config())
        }
    }

    fn validate(&self) -> MemoResult<()> {
        if self.digest.max_depth == 0 {
            return Err(crate::MemoError::config("digest.max_depth deve ser pelo menos 1"));
        }
        if self.demo.matrix_size == 0 {
            return Err(crate::MemoError::config("demo.matrix_size deve ser pelo menos 1"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = Config::default_config();
        config.digest.max_depth = 16;
        config.general.log_format = "json".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[digest]\nmax_depth = 8\n").unwrap();
        assert_eq!(config.digest.max_depth, 8);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.demo.matrix_size, 1000);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[digest]\nmax_depth = 0\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(crate::MemoError::Config(_))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default_config());
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[demo]\nmatrix_size = 12\n").unwrap();

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.demo.matrix_size, 12);
    }

    #[test]
    fn test_load_or_default_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[digest]\nmax_depth = 0\n").unwrap();

        assert!(Config::load_or_default(&path).is_err());
    }
}
