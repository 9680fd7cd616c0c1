use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use bundle_inspector::{router, AppState, InspectorConfig, SingleFlightCache};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "bundle-inspector.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let cfg = InspectorConfig::load_with_env(&args.config)?;
    let bind_addr: SocketAddr = cfg.bind_addr.parse().with_context(|| format!("bad bind address {}", cfg.bind_addr))?;

    let state = AppState::new(
        Arc::new(cfg.mint_source()),
        Arc::new(cfg.history_source()?),
        cfg.thresholds.clone(),
        SingleFlightCache::new(cfg.cache_ttl(), cfg.cache_capacity()),
        cfg.min_slot_transactions,
        cfg.fetch_timeout(),
        cfg.admin_token.clone(),
    )?;

    info!(%bind_addr, rpc = %cfg.rpc_url, ttl_secs = cfg.cache_ttl_secs, capacity = cfg.cache_capacity, "listening");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
