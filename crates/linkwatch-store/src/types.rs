//! Domain types for the Linkwatch store.
//!
//! These types represent the persisted state of targets, check results, and
//! idempotency keys. All types are serializable to/from JSON for storage in
//! redb tables; `CheckResult` serializes through a wire form so the
//! status/error pair always appears as two nullable fields with exactly one
//! set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a target (`t_` + 24 hex chars).
pub type TargetId = String;

// ── Target ─────────────────────────────────────────────────────────

/// A registered URL under monitoring.
///
/// `canonical_url` is unique across the store: registering two URLs that
/// canonicalize identically yields the same target. `host` is the lowercased
/// host of the canonical URL without any port, used by the checker's
/// per-host limiter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub id: TargetId,
    /// The raw URL as originally submitted.
    pub url: String,
    /// Normalized form used for deduplication and probing.
    pub canonical_url: String,
    /// Host of the canonical URL, lowercased, no port.
    pub host: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a `create_target` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new target (and idempotency record, if a key was given) was stored.
    Created,
    /// An existing target was returned; nothing was written.
    Duplicate,
}

// ── CheckResult ────────────────────────────────────────────────────

/// Outcome of the final attempt of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// An HTTP response was received; only the status line is recorded.
    Response { status_code: u16 },
    /// No response: transport error, DNS failure, or timeout.
    Failed { error: String },
}

impl CheckOutcome {
    /// The status code, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CheckOutcome::Response { status_code } => Some(*status_code),
            CheckOutcome::Failed { .. } => None,
        }
    }

    /// The error message, if no response was received.
    pub fn error(&self) -> Option<&str> {
        match self {
            CheckOutcome::Response { .. } => None,
            CheckOutcome::Failed { error } => Some(error),
        }
    }
}

/// The outcome of one scheduled probe of a target.
///
/// Append-only; at most one record is written per target per scheduler tick.
/// `checked_at` is the start of the attempt that produced this record and
/// `latency_ms` covers that attempt only, from request send to
/// response-headers-received or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "CheckResultWire", try_from = "CheckResultWire")]
pub struct CheckResult {
    /// `cr_` + 24 hex chars. May be left empty; the store then assigns one.
    pub id: String,
    pub target_id: TargetId,
    pub checked_at: DateTime<Utc>,
    pub outcome: CheckOutcome,
    pub latency_ms: u64,
}

/// Wire form of [`CheckResult`]: the outcome as two nullable columns.
///
/// Exactly one of `status_code` / `error` is non-null; both storage and the
/// API emit `null` for the absent branch.
#[derive(Serialize, Deserialize)]
pub struct CheckResultWire {
    pub id: String,
    pub target_id: TargetId,
    pub checked_at: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl From<CheckResult> for CheckResultWire {
    fn from(result: CheckResult) -> Self {
        let status_code = result.outcome.status_code();
        let error = result.outcome.error().map(str::to_string);
        CheckResultWire {
            id: result.id,
            target_id: result.target_id,
            checked_at: result.checked_at,
            status_code,
            latency_ms: result.latency_ms,
            error,
        }
    }
}

impl TryFrom<CheckResultWire> for CheckResult {
    type Error = String;

    fn try_from(wire: CheckResultWire) -> Result<Self, String> {
        let outcome = match (wire.status_code, wire.error) {
            (Some(status_code), None) => CheckOutcome::Response { status_code },
            (None, Some(error)) => CheckOutcome::Failed { error },
            _ => return Err("exactly one of status_code and error must be set".to_string()),
        };
        Ok(CheckResult {
            id: wire.id,
            target_id: wire.target_id,
            checked_at: wire.checked_at,
            outcome,
            latency_ms: wire.latency_ms,
        })
    }
}

// ── IdempotencyRecord ──────────────────────────────────────────────

/// Binds a client-supplied idempotency key to the target it first created.
///
/// Written only in the same transaction as its target; a key maps to at most
/// one target for the lifetime of the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdempotencyRecord {
    pub key: String,
    pub target_id: TargetId,
    pub created_at: DateTime<Utc>,
}

// ── List parameters ────────────────────────────────────────────────

/// Parameters for listing targets with filtering and cursor pagination.
#[derive(Debug, Clone, Default)]
pub struct ListTargetsParams {
    /// Equality filter on `host` (already lowercased by the caller).
    pub host: Option<String>,
    /// Strict lower bound: only rows with `(created_at, id)` greater than
    /// this cursor are returned.
    pub after: Option<(DateTime<Utc>, TargetId)>,
    /// Maximum rows to return. Clamped by the API adapter, not the store.
    pub limit: usize,
}

/// Parameters for listing check results of one target.
#[derive(Debug, Clone)]
pub struct ListCheckResultsParams {
    pub target_id: TargetId,
    /// Strict lower bound on `checked_at`.
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}
