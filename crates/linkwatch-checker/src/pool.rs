//! Worker pool — bounded-concurrency probe execution.
//!
//! Targets are submitted onto a bounded queue and consumed by a fixed set
//! of worker tasks. Submission never blocks: when the queue is full the
//! target is dropped with a warning and picked up again on the next
//! scheduler tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use linkwatch_store::{CheckResult, Store, Target};
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::limiter::HostLimiter;
use crate::probe::Prober;

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum concurrently executing probes.
    pub max_concurrency: usize,
    /// Per-attempt HTTP deadline.
    pub http_timeout: Duration,
    /// Disable TLS certificate verification on probes.
    pub insecure_skip_verify: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            http_timeout: Duration::from_secs(5),
            insecure_skip_verify: false,
        }
    }
}

/// Shared state each worker needs to run one check.
struct CheckRunner {
    store: Store,
    limiter: HostLimiter,
    prober: Prober,
}

impl CheckRunner {
    async fn check(&self, target: Target) {
        if !self.limiter.acquire(&target.host) {
            debug!(
                id = %target.id,
                host = %target.host,
                "host already being checked, skipping until next tick"
            );
            return;
        }
        let report = self.prober.probe(&target.canonical_url).await;
        self.limiter.release(&target.host);

        let result = CheckResult {
            id: String::new(),
            target_id: target.id.clone(),
            checked_at: report.checked_at,
            outcome: report.outcome,
            latency_ms: report.latency_ms,
        };
        if let Err(err) = self.store.create_check_result(&result) {
            error!(id = %target.id, error = %err, "failed to persist check result");
        }
    }
}

/// Fixed-size pool of probe workers over a bounded submission queue.
///
/// The queue holds `2 * max_concurrency` targets to absorb bursts. `stop`
/// closes the queue and waits for every in-flight probe to finish its
/// current attempt and write its result.
pub struct WorkerPool {
    jobs: Mutex<Option<mpsc::Sender<Target>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create the pool and start its workers.
    pub fn new(store: Store, config: PoolConfig) -> Result<Self, reqwest::Error> {
        let prober = Prober::new(config.http_timeout, config.insecure_skip_verify)?;
        let runner = Arc::new(CheckRunner {
            store,
            limiter: HostLimiter::new(),
            prober,
        });

        let (tx, rx) = mpsc::channel(config.max_concurrency * 2);
        let rx = Arc::new(AsyncMutex::new(rx));

        let mut workers = Vec::with_capacity(config.max_concurrency);
        for _ in 0..config.max_concurrency {
            let rx = rx.clone();
            let runner = runner.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    // Scope the lock so other workers can receive while
                    // this one probes.
                    let target = { rx.lock().await.recv().await };
                    match target {
                        Some(target) => runner.check(target).await,
                        None => break,
                    }
                }
            }));
        }

        Ok(Self {
            jobs: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        })
    }

    /// Submit a target for checking. Never blocks: a full queue drops the
    /// target with a warning.
    pub fn submit(&self, target: Target) {
        let jobs = self.jobs.lock().unwrap();
        let Some(tx) = jobs.as_ref() else {
            debug!(id = %target.id, "worker pool stopped, dropping submission");
            return;
        };
        match tx.try_send(target) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(target)) => {
                warn!(id = %target.id, "submission queue full, dropping check");
            }
            Err(mpsc::error::TrySendError::Closed(target)) => {
                debug!(id = %target.id, "submission queue closed, dropping check");
            }
        }
    }

    /// Close the queue and wait for all in-flight probes to complete.
    /// Idempotent.
    pub async fn stop(&self) {
        let tx = self.jobs.lock().unwrap().take();
        drop(tx);
        let handles: Vec<JoinHandle<()>> = self.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "worker task failed");
            }
        }
    }
}
