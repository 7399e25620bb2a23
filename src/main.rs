use clap::Parser;
use memoize::cli::{Cli, Commands};
use memoize::types::config::Config;
use memoize::MemoResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> MemoResult<()> {
    let cli = Cli::parse();

    // Carrega configuração primeiro (sem logging ainda)
    let config = Config::load_or_default(&cli.config)?;

    // Flags da CLI têm precedência sobre a configuração
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("memoize={}", log_level)
            .parse()
            .unwrap_or_else(|_| "memoize=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Key {
            args,
            named,
            canonical,
        } => {
            memoize::cli::commands::key(&args, &named, canonical, &config)?;
        }
        Commands::Demo { size } => {
            memoize::cli::commands::demo(size, &config).await?;
        }
        Commands::Init { path } => {
            memoize::cli::commands::init(path)?;
        }
        Commands::Config => {
            memoize::cli::commands::config_cmd(&config)?;
        }
        Commands::Version => {
            memoize::cli::commands::version();
        }
    }

    Ok(())
}
