//! Storefront API server binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use storefront_core::{StorageBackend, StorefrontConfig};
use storefront_server::StorefrontServer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storefront", version, about = "Storefront REST API server")]
struct Cli {
    /// Path to the TOML config file. Defaults to ./storefront.toml when present.
    #[arg(long, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:3000 (overrides server.bind).
    #[arg(long, env = "STOREFRONT_BIND")]
    bind: Option<String>,

    /// SQLite database file (overrides database.path).
    #[arg(long, env = "STOREFRONT_DATABASE")]
    database: Option<PathBuf>,

    /// Keep all data in process memory instead of SQLite.
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// Log filter directive, e.g. "info" or "storefront_store=debug".
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level)
                .with_context(|| format!("invalid log filter '{}'", cli.log_level))?,
        )
        .init();

    let config = load_config(&cli)?;
    tracing::info!(
        bind = %config.server.bind,
        backend = ?config.database.backend,
        database = %config.database.path.display(),
        "Starting storefront"
    );

    StorefrontServer::new(config).run().await?;
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<StorefrontConfig> {
    let mut config =
        StorefrontConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    if cli.memory {
        config.database.backend = StorageBackend::Memory;
    }

    Ok(config)
}
