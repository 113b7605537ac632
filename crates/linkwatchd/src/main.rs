//! linkwatchd — the Linkwatch daemon.
//!
//! Registers HTTP(S) URLs through a small REST API, probes every target
//! once per check interval through a bounded worker pool, and serves the
//! probe history. Configuration comes from environment variables (see
//! [`config::Config`]); SIGINT and SIGTERM trigger a graceful shutdown
//! capped by `SHUTDOWN_GRACE`.

mod config;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

use linkwatch_api::build_router;
use linkwatch_checker::{PoolConfig, Scheduler, WorkerPool};
use linkwatch_store::Store;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let config = Config::from_env();

    let store = Store::open(Path::new(&config.database_url))
        .with_context(|| format!("failed to open store at {}", config.database_url))?;
    info!(path = %config.database_url, "store opened");

    let pool = WorkerPool::new(
        store.clone(),
        PoolConfig {
            max_concurrency: config.max_concurrency,
            http_timeout: config.http_timeout,
            insecure_skip_verify: config.insecure_skip_verify,
        },
    )
    .context("failed to build worker pool")?;

    let scheduler = Scheduler::new(store.clone(), pool, config.check_interval);
    scheduler.start();

    let router = build_router(store);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "API server starting");

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    spawn_signal_listener(shutdown_tx)?;

    let mut server_shutdown = shutdown_rx.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = server_shutdown.changed().await;
    });
    let server_task = tokio::spawn(async move { server.await });

    // Block until SIGINT/SIGTERM.
    let _ = shutdown_rx.changed().await;
    info!("shutdown signal received, starting graceful shutdown");

    let drained = tokio::time::timeout(config.shutdown_grace, async {
        // Stop the ticker first so no new probes start, drain in-flight
        // probes and their writes, then let API requests finish.
        scheduler.stop().await;
        let _ = server_task.await;
    })
    .await;
    if drained.is_err() {
        warn!(grace = ?config.shutdown_grace, "shutdown grace expired before full drain");
    }

    info!("linkwatchd stopped");
    Ok(())
}

/// Flip the shutdown channel on the first SIGINT or SIGTERM.
fn spawn_signal_listener(shutdown_tx: watch::Sender<bool>) -> anyhow::Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        let _ = shutdown_tx.send(true);
    });
    Ok(())
}
