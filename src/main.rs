use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use vaultaire::config::VaultConfig;
use vaultaire::daymap::{DayMapSource, OriginDayMaps};
use vaultaire::dispatcher::Dispatcher;
use vaultaire::model::Origin;

#[derive(Parser)]
#[command(name = "vaultaire", about = "Per-origin write pipeline for a time-series point store.")]
struct Cli {
    /// Path to the YAML config file (broker URL, pool URL, batch period).
    #[arg(short, long, default_value = "vaultaire.yaml")]
    config: PathBuf,
}

/// Placeholder day-map source until a concrete object-store-backed one is
/// wired in — the object store itself is an external collaborator (§6).
struct UnconfiguredDayMapSource;

#[async_trait::async_trait]
impl DayMapSource for UnconfiguredDayMapSource {
    async fn fetch(&self, _origin: &Origin) -> OriginDayMaps {
        OriginDayMaps::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vaultaire=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = VaultConfig::load(&cli.config)?;

    info!(broker = %config.broker_url, pool = %config.pool_url, "vaultaire starting");

    let (flush_tx, mut flush_rx) = tokio::sync::mpsc::channel(64);
    let _dispatcher = Dispatcher::new(
        Arc::new(UnconfiguredDayMapSource),
        config.batch_period(),
        flush_tx,
    );

    // The broker adapter and object-store-backed flush consumer are external
    // collaborators (§6); this drains completed batches so the channel
    // doesn't back up while those integrations are absent.
    tokio::spawn(async move { while flush_rx.recv().await.is_some() {} });

    tokio::signal::ctrl_c().await?;
    info!("vaultaire shutting down");

    Ok(())
}
