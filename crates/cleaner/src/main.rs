mod decode;
mod duration;
mod store;
mod sweep;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duration::parse_duration;
use store::{RedisTicketStore, TicketStore};

/// Delete tickets older than a threshold from a matchmaking ticket store.
#[derive(Debug, Parser)]
#[command(name = "om-ticket-cleaner", version)]
#[command(after_help = "Example: om-ticket-cleaner 127.0.0.1:6379 10m")]
struct Args {
    /// Store address, as host:port or a redis:// URL
    store_addr: String,

    /// Minimum ticket age to delete (e.g. 10m, 1h30m, 500ms)
    #[arg(value_parser = parse_duration)]
    stale_duration: Duration,

    /// Set holding the keys of all tickets
    #[arg(long, default_value = "allTickets")]
    set_key: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_json);

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(args: Args) -> Result<()> {
    info!(
        store = %args.store_addr,
        set_key = %args.set_key,
        "Deleting tickets older than {:?}",
        args.stale_duration
    );

    tokio::select! {
        result = clean(&args) => result,
        _ = shutdown_signal() => bail!("interrupted before the sweep finished"),
    }
}

async fn clean(args: &Args) -> Result<()> {
    let store = RedisTicketStore::connect(&args.store_addr)
        .await
        .with_context(|| format!("failed to connect to {}", args.store_addr))?;
    store
        .ping()
        .await
        .with_context(|| format!("failed to ping {}", args.store_addr))?;

    let report = sweep::sweep(
        &store,
        &args.set_key,
        args.stale_duration,
        chrono::Utc::now(),
    )
    .await
    .with_context(|| format!("failed to sweep {}", args.set_key))?;

    info!(
        "Removed {} of {} tickets ({} skipped)",
        report.removed.len(),
        report.scanned,
        report.skipped
    );
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
