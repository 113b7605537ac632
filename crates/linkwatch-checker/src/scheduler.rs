//! Scheduler — periodic fan-out of all targets to the worker pool.
//!
//! A single ticker task performs one scheduling pass immediately on start
//! and then once per check interval. A pass loads every target from the
//! store and submits each to the pool in store order; the pool may drop
//! submissions when its queue is full, which is fine because the next tick
//! resubmits everything. No per-target timing state is kept.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use linkwatch_store::Store;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::pool::WorkerPool;

/// Periodic check scheduler. Owns the worker pool for its lifetime.
pub struct Scheduler {
    store: Store,
    pool: Arc<WorkerPool>,
    check_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(store: Store, pool: WorkerPool, check_interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store,
            pool: Arc::new(pool),
            check_interval,
            shutdown_tx,
            ticker: Mutex::new(None),
        }
    }

    /// Start the ticker: one immediate pass, then one per interval.
    pub fn start(&self) {
        let store = self.store.clone();
        let pool = self.pool.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.check_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => schedule_checks(&store, &pool),
                    _ = shutdown_rx.changed() => {
                        debug!("scheduler loop shutting down");
                        break;
                    }
                }
            }
        });
        *self.ticker.lock().unwrap() = Some(handle);
        info!(interval = ?self.check_interval, "scheduler started");
    }

    /// Stop the ticker so no new submissions occur, then drain the pool.
    /// Returns once both are fully quiesced.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let ticker = self.ticker.lock().unwrap().take();
        if let Some(handle) = ticker {
            let _ = handle.await;
        }
        self.pool.stop().await;
        info!("scheduler stopped");
    }
}

/// One scheduling pass: fetch all targets and hand them to the pool.
fn schedule_checks(store: &Store, pool: &WorkerPool) {
    let targets = match store.all_targets() {
        Ok(targets) => targets,
        Err(err) => {
            error!(error = %err, "failed to load targets for scheduling");
            return;
        }
    };
    if targets.is_empty() {
        debug!("no targets to check");
        return;
    }
    let count = targets.len();
    for target in targets {
        pool.submit(target);
    }
    debug!(count, "targets submitted for checking");
}
