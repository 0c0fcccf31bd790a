use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cloudnova_metrics::config::{FeedConfig, ServerConfig, DEFAULT_CADENCE_MS};
use cloudnova_metrics::{server, AppState};

/// CloudNova statistics dashboard backend.
#[derive(Debug, Parser)]
#[command(name = "cloudnova-metrics", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "CLOUDNOVA_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Milliseconds between two snapshots
    #[arg(long, env = "CLOUDNOVA_CADENCE_MS", default_value_t = DEFAULT_CADENCE_MS)]
    cadence_ms: u64,

    /// Fixed RNG seed for a reproducible feed
    #[arg(long, env = "CLOUDNOVA_SEED")]
    seed: Option<u64>,

    /// Directory holding the dashboard page
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Start the feed immediately instead of waiting for the dashboard
    #[arg(long)]
    autostart: bool,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            addr: cli.addr,
            feed: FeedConfig {
                cadence_ms: cli.cadence_ms,
                seed: cli.seed,
            },
            static_dir: cli.static_dir,
            autostart: cli.autostart,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Logging ───────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from(Cli::parse());

    // ── 2. Build the feed ────────────────────────────────────────
    let state = Arc::new(
        AppState::new(config.feed.clone()).context("building live metrics feed")?,
    );
    if config.autostart {
        state.feed().start();
    }

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state.clone(), config.static_dir.as_deref());

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(addr = %config.addr, "dashboard listening");
    info!("metrics JSON  → /api/metrics");
    info!("metrics SSE   → /api/metrics/stream");
    info!("feed control  → /api/feed/{{start,stop,status}}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Stop the timer on every exit path, including a serve error.
    state.feed().stop();
    served.context("server exited with error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
}
