//! Store — redb-backed persistence for Linkwatch.
//!
//! Provides typed operations over targets, check results, and idempotency
//! keys. All values are JSON-serialized into redb's `&[u8]` value columns.
//! The store supports both on-disk and in-memory backends (the latter for
//! testing). Target creation, its index rows, and the idempotency record
//! are committed in a single write transaction.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::ids;
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe store backed by redb.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(TARGETS).map_err(map_err!(Table))?;
        txn.open_table(TARGETS_BY_CREATED).map_err(map_err!(Table))?;
        txn.open_table(TARGETS_BY_CANONICAL).map_err(map_err!(Table))?;
        txn.open_table(TARGETS_BY_HOST).map_err(map_err!(Table))?;
        txn.open_table(CHECK_RESULTS).map_err(map_err!(Table))?;
        txn.open_table(IDEMPOTENCY_KEYS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Targets ────────────────────────────────────────────────────

    /// Insert a target, enforcing idempotency-key replay and canonical-URL
    /// uniqueness.
    ///
    /// - A previously recorded idempotency key returns the target it was
    ///   first bound to, regardless of the submitted target (key wins).
    /// - An existing `canonical_url` returns the pre-existing target; the
    ///   idempotency key, if any, is *not* recorded in that case.
    /// - Otherwise the target, its index rows, and the idempotency record
    ///   are inserted in one transaction.
    pub fn create_target(
        &self,
        target: &Target,
        idempotency_key: Option<&str>,
    ) -> StoreResult<(Target, CreateOutcome)> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;

        if let Some(key) = idempotency_key {
            let keys = txn.open_table(IDEMPOTENCY_KEYS).map_err(map_err!(Table))?;
            let replay = match keys.get(key).map_err(map_err!(Read))? {
                Some(guard) => Some(
                    serde_json::from_slice::<IdempotencyRecord>(guard.value())
                        .map_err(map_err!(Deserialize))?,
                ),
                None => None,
            };
            drop(keys);
            if let Some(record) = replay {
                let targets = txn.open_table(TARGETS).map_err(map_err!(Table))?;
                let existing = read_target(&targets, &record.target_id)?.ok_or_else(|| {
                    StoreError::Read(format!(
                        "idempotency key references missing target {}",
                        record.target_id
                    ))
                })?;
                // Dropping the transaction aborts it; nothing was written.
                return Ok((existing, CreateOutcome::Duplicate));
            }
        }

        {
            let by_canonical = txn
                .open_table(TARGETS_BY_CANONICAL)
                .map_err(map_err!(Table))?;
            let existing_id = by_canonical
                .get(target.canonical_url.as_str())
                .map_err(map_err!(Read))?
                .map(|guard| guard.value().to_string());
            drop(by_canonical);
            if let Some(id) = existing_id {
                let targets = txn.open_table(TARGETS).map_err(map_err!(Table))?;
                let existing = read_target(&targets, &id)?.ok_or_else(|| {
                    StoreError::Read(format!("canonical index references missing target {id}"))
                })?;
                return Ok((existing, CreateOutcome::Duplicate));
            }
        }

        {
            let value = serde_json::to_vec(target).map_err(map_err!(Serialize))?;
            let mut targets = txn.open_table(TARGETS).map_err(map_err!(Table))?;
            targets
                .insert(target.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;

            let mut by_canonical = txn
                .open_table(TARGETS_BY_CANONICAL)
                .map_err(map_err!(Table))?;
            by_canonical
                .insert(target.canonical_url.as_str(), target.id.as_str())
                .map_err(map_err!(Write))?;

            let mut by_created = txn.open_table(TARGETS_BY_CREATED).map_err(map_err!(Table))?;
            let order_key = target_order_key(&target.created_at, &target.id);
            by_created
                .insert(order_key.as_str(), target.id.as_str())
                .map_err(map_err!(Write))?;

            let mut by_host = txn.open_table(TARGETS_BY_HOST).map_err(map_err!(Table))?;
            let host_key = host_order_key(&target.host, &target.created_at, &target.id);
            by_host
                .insert(host_key.as_str(), target.id.as_str())
                .map_err(map_err!(Write))?;

            if let Some(key) = idempotency_key {
                let record = IdempotencyRecord {
                    key: key.to_string(),
                    target_id: target.id.clone(),
                    created_at: chrono::Utc::now(),
                };
                let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
                let mut keys = txn.open_table(IDEMPOTENCY_KEYS).map_err(map_err!(Table))?;
                keys.insert(key, value.as_slice()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %target.id, host = %target.host, "target stored");
        Ok((target.clone(), CreateOutcome::Created))
    }

    /// Get a target by id.
    pub fn target_by_id(&self, id: &str) -> StoreResult<Option<Target>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let targets = txn.open_table(TARGETS).map_err(map_err!(Table))?;
        read_target(&targets, id)
    }

    /// List targets in `(created_at, id)` order.
    ///
    /// The cursor in `params.after` is a strict lower bound; the host filter
    /// is byte-equality (the caller lowercases) and served from the host
    /// index. `params.limit` caps the number of returned rows.
    pub fn list_targets(&self, params: &ListTargetsParams) -> StoreResult<Vec<Target>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let targets = txn.open_table(TARGETS).map_err(map_err!(Table))?;

        // Pick the index and bounds: both indexes order by (created_at, id)
        // within their key space, so the cursor is just a lower bound.
        let (index, lower_key, upper_key) = match (&params.host, &params.after) {
            (Some(host), Some((time, id))) => {
                let (_, end) = host_bounds(host);
                (
                    txn.open_table(TARGETS_BY_HOST).map_err(map_err!(Table))?,
                    Bound::Excluded(host_order_key(host, time, id)),
                    Bound::Excluded(end),
                )
            }
            (Some(host), None) => {
                let (start, end) = host_bounds(host);
                (
                    txn.open_table(TARGETS_BY_HOST).map_err(map_err!(Table))?,
                    Bound::Included(start),
                    Bound::Excluded(end),
                )
            }
            (None, Some((time, id))) => (
                txn.open_table(TARGETS_BY_CREATED).map_err(map_err!(Table))?,
                Bound::Excluded(target_order_key(time, id)),
                Bound::Unbounded,
            ),
            (None, None) => (
                txn.open_table(TARGETS_BY_CREATED).map_err(map_err!(Table))?,
                Bound::Unbounded,
                Bound::Unbounded,
            ),
        };
        let lower = borrow_bound(&lower_key);
        let upper = borrow_bound(&upper_key);

        let mut out = Vec::new();
        for entry in index.range::<&str>((lower, upper)).map_err(map_err!(Read))? {
            let (_, id_guard) = entry.map_err(map_err!(Read))?;
            let id = id_guard.value();
            let target = read_target(&targets, id)?.ok_or_else(|| {
                StoreError::Read(format!("ordering index references missing target {id}"))
            })?;
            out.push(target);
            if out.len() >= params.limit {
                break;
            }
        }
        Ok(out)
    }

    /// All targets in `(created_at, id)` order. Used by the scheduler.
    pub fn all_targets(&self) -> StoreResult<Vec<Target>> {
        self.list_targets(&ListTargetsParams {
            host: None,
            after: None,
            limit: usize::MAX,
        })
    }

    // ── Check results ──────────────────────────────────────────────

    /// Append a check result, assigning a `cr_` id when the caller left it
    /// empty. Returns the stored id.
    pub fn create_check_result(&self, result: &CheckResult) -> StoreResult<String> {
        let mut stored = result.clone();
        if stored.id.is_empty() {
            stored.id = ids::generate(ids::CHECK_RESULT_PREFIX);
        }
        let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut results = txn.open_table(CHECK_RESULTS).map_err(map_err!(Table))?;
            let key = check_result_key(&stored.target_id, &stored.checked_at, &stored.id);
            results
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(stored.id)
    }

    /// List check results for one target, newest first.
    ///
    /// `params.since`, if set, is a strict lower bound on `checked_at`.
    pub fn list_check_results(
        &self,
        params: &ListCheckResultsParams,
    ) -> StoreResult<Vec<CheckResult>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let results = txn.open_table(CHECK_RESULTS).map_err(map_err!(Table))?;

        let (start, end) = check_result_bounds(&params.target_id);
        let mut out = Vec::new();
        // Keys ascend in checked_at; walk the range backwards for DESC order.
        for entry in results
            .range(start.as_str()..end.as_str())
            .map_err(map_err!(Read))?
            .rev()
        {
            let (_, guard) = entry.map_err(map_err!(Read))?;
            let result: CheckResult =
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
            if let Some(since) = params.since {
                if result.checked_at <= since {
                    // Everything further back is older still.
                    break;
                }
            }
            out.push(result);
            if out.len() >= params.limit {
                break;
            }
        }
        Ok(out)
    }
}

/// Borrow an owned key bound for a redb range call.
fn borrow_bound(bound: &Bound<String>) -> Bound<&str> {
    match bound {
        Bound::Included(key) => Bound::Included(key.as_str()),
        Bound::Excluded(key) => Bound::Excluded(key.as_str()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Decode a target row out of any readable view of the `targets` table.
fn read_target(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    id: &str,
) -> StoreResult<Option<Target>> {
    match table.get(id).map_err(map_err!(Read))? {
        Some(guard) => Ok(Some(
            serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?,
        )),
        None => Ok(None),
    }
}
