//! HTTP probe execution.
//!
//! One probe is a bounded sequence of GET attempts against a canonical URL,
//! producing the final attempt's timing and outcome. Transport failures and
//! 5xx responses are retried with doubling backoff; everything else is
//! final.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use linkwatch_store::CheckOutcome;
use reqwest::redirect;
use tracing::debug;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_REDIRECTS: usize = 5;

const USER_AGENT: &str = concat!("linkwatch/", env!("CARGO_PKG_VERSION"));

/// The final attempt of a completed probe.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Start of the attempt that produced the outcome.
    pub checked_at: DateTime<Utc>,
    /// Wall-clock of that attempt, request send to headers or error.
    pub latency_ms: u64,
    pub outcome: CheckOutcome,
}

/// Runs probes on a shared HTTP client.
///
/// The client follows up to five redirects and then returns the last
/// response as the outcome, times out each attempt independently, and never
/// reads response bodies.
#[derive(Clone)]
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new(http_timeout: Duration, insecure_skip_verify: bool) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(http_timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::custom(|attempt| {
                if attempt.previous().len() > MAX_REDIRECTS {
                    attempt.stop()
                } else {
                    attempt.follow()
                }
            }))
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;
        Ok(Self { client })
    }

    /// Probe a URL and return the final attempt's report.
    pub async fn probe(&self, url: &str) -> ProbeReport {
        let mut attempts = 0;
        let mut backoff = INITIAL_BACKOFF;
        loop {
            attempts += 1;
            let checked_at = Utc::now();
            let started = Instant::now();
            // Only the status line matters; the response is dropped unread.
            let outcome = match self.client.get(url).send().await {
                Ok(response) => CheckOutcome::Response {
                    status_code: response.status().as_u16(),
                },
                Err(err) => CheckOutcome::Failed {
                    error: err.to_string(),
                },
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            if attempts < MAX_ATTEMPTS && retryable(&outcome) {
                debug!(
                    %url,
                    attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "probe attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            return ProbeReport {
                checked_at,
                latency_ms,
                outcome,
            };
        }
    }
}

/// Transport failures and server errors get another attempt.
fn retryable(outcome: &CheckOutcome) -> bool {
    match outcome {
        CheckOutcome::Failed { .. } => true,
        CheckOutcome::Response { status_code } => (500..=599).contains(status_code),
    }
}
