//! Interface de linha de comando do memoize.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// memoize - inspeciona chaves de cache e exercita wrappers memoizados.
#[derive(Parser, Debug)]
#[command(name = "memoize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "memoize.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mostra a chave de cache de uma lista de argumentos em JSON.
    Key {
        /// Argumentos posicionais, cada um um valor JSON (ex.: 3, 3.0, '"text"', '[1,2]').
        args: Vec<String>,

        /// Argumento nomeado no formato nome=JSON. Pode ser repetido.
        #[arg(short, long = "named", value_name = "NAME=JSON")]
        named: Vec<String>,

        /// Mostra também os bytes canônicos usados no hash, em hex.
        #[arg(long)]
        canonical: bool,
    },

    /// Executa os cenários de memoização.
    Demo {
        /// Lado da matriz quadrada do cenário de tempo.
        #[arg(short, long)]
        size: Option<usize>,
    },

    /// Cria um arquivo de configuração padrão.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Mostra a configuração efetiva.
    Config,

    /// Mostra a versão.
    Version,
}
