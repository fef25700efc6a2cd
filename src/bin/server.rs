//! txkv Server Binary
//!
//! Serves the store over HTTP, appending every mutation to the transaction log.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use txkv::config::SyncPolicy;
use txkv::http::{self, AppState};
use txkv::{telemetry, Config, FileLog, Store};

/// txkv Server
#[derive(Parser, Debug)]
#[command(name = "txkv-server")]
#[command(about = "Durable key-value store over HTTP")]
#[command(version)]
struct Args {
    /// Transaction log file
    #[arg(short = 'f', long, default_value = "kv.log")]
    log_path: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:8081")]
    listen: String,

    /// When to fsync the transaction log
    #[arg(long, value_enum, default_value_t = SyncMode::Manual)]
    sync: SyncMode,

    /// Appends between syncs when --sync=every-n
    #[arg(long, default_value = "100")]
    sync_every: usize,

    /// Time allowed for in-flight requests on shutdown, in milliseconds
    #[arg(long, default_value = "5000")]
    shutdown_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SyncMode {
    /// Sync only on shutdown
    Manual,
    /// Sync after every append
    EveryWrite,
    /// Sync after --sync-every appends
    EveryN,
}

impl Args {
    fn sync_policy(&self) -> SyncPolicy {
        match self.sync {
            SyncMode::Manual => SyncPolicy::Manual,
            SyncMode::EveryWrite => SyncPolicy::EveryWrite,
            SyncMode::EveryN => SyncPolicy::EveryNEntries {
                count: self.sync_every,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init(telemetry::DEFAULT_FILTER)?;

    let args = Args::parse();

    let config = Config::builder()
        .log_path(&args.log_path)
        .listen_addr(&args.listen)
        .sync_policy(args.sync_policy())
        .shutdown_timeout_ms(args.shutdown_timeout_ms)
        .build();
    config.validate()?;

    let span = telemetry::service_span("kv-service");
    tracing::info!(parent: &span, version = txkv::VERSION, "starting kv-service");
    tracing::info!(parent: &span, log_path = ?config.log_path, sync = ?config.sync_policy, "opening transaction log");

    let log = FileLog::open_with(&config.log_path, config.sync_policy)
        .context("failed to create transaction log")?;
    let store = Arc::new(Store::new(log));
    let state = Arc::new(AppState::new(store, span.clone())?);

    http::run(&config, state, shutdown_signal(span.clone())).await?;

    tracing::info!(parent: &span, "kv-service stopped gracefully");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal(span: tracing::Span) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(parent: &span, error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(parent: &span, error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(parent: &span, signal = "SIGINT", "shutting down kv-service"),
        _ = terminate => tracing::info!(parent: &span, signal = "SIGTERM", "shutting down kv-service"),
    }
}
