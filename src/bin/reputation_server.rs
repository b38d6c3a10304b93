//! HTTP server binary for the reputation service.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use reputation::config::ReputationConfig;
use reputation_search::ResultCache;
use tracing_subscriber::EnvFilter;

/// Country-scoped reputation analysis over HTTP.
#[derive(Parser)]
#[command(name = "reputation-server", version, about)]
struct Cli {
    /// Path to TOML configuration file. Defaults to the platform config
    /// directory; a missing default file means built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReputationConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let path = ReputationConfig::default_config_path();
            if path.exists() {
                ReputationConfig::from_file(&path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?
            } else {
                tracing::info!("no config at {}, using defaults", path.display());
                ReputationConfig::default()
            }
        }
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.apply_env_overrides();
    config.validate().context("invalid configuration")?;

    if !config.search.has_credentials() {
        tracing::warn!("search credentials missing, every country will be scored from synthetic data");
    }

    let cache = ResultCache::new(config.cache.max_entries);
    reputation::server::serve(&config, cache).await?;
    Ok(())
}
