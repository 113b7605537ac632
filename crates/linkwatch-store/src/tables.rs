//! redb table definitions and composite-key helpers for the Linkwatch store.
//!
//! Primary rows use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Ordering indexes embed timestamps as zero-padded nanosecond
//! counts so lexicographic key order equals `(created_at, id)` tuple order,
//! which makes cursor pagination a plain excluded-bound range scan.

use chrono::{DateTime, Utc};
use redb::TableDefinition;

/// Targets keyed by `{id}`.
pub const TARGETS: TableDefinition<&str, &[u8]> = TableDefinition::new("targets");

/// Ordering index: `{created_at_nanos:020}|{id}` → target id.
pub const TARGETS_BY_CREATED: TableDefinition<&str, &str> =
    TableDefinition::new("targets_by_created");

/// Uniqueness index: `{canonical_url}` → target id.
pub const TARGETS_BY_CANONICAL: TableDefinition<&str, &str> =
    TableDefinition::new("targets_by_canonical");

/// Host index: `{host}|{created_at_nanos:020}|{id}` → target id.
///
/// Keeps host-filtered listings in `(created_at, id)` order without a scan.
pub const TARGETS_BY_HOST: TableDefinition<&str, &str> = TableDefinition::new("targets_by_host");

/// Check results keyed by `{target_id}|{checked_at_nanos:020}|{id}`.
pub const CHECK_RESULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("check_results");

/// Idempotency records keyed by the client-supplied key.
pub const IDEMPOTENCY_KEYS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("idempotency_keys");

/// Key in `TARGETS_BY_CREATED` for a target created at `created_at`.
pub fn target_order_key(created_at: &DateTime<Utc>, id: &str) -> String {
    format!("{:020}|{id}", created_at.timestamp_nanos_opt().unwrap_or(0))
}

/// Key in `TARGETS_BY_HOST` for a target of `host` created at `created_at`.
pub fn host_order_key(host: &str, created_at: &DateTime<Utc>, id: &str) -> String {
    format!("{host}|{}", target_order_key(created_at, id))
}

/// Half-open key range covering every `TARGETS_BY_HOST` row of `host`.
pub fn host_bounds(host: &str) -> (String, String) {
    (format!("{host}|"), format!("{host}}}"))
}

/// Key in `CHECK_RESULTS` for one result row.
pub fn check_result_key(target_id: &str, checked_at: &DateTime<Utc>, id: &str) -> String {
    format!(
        "{target_id}|{:020}|{id}",
        checked_at.timestamp_nanos_opt().unwrap_or(0)
    )
}

/// Half-open key range covering every check result of `target_id`.
///
/// `|` (0x7C) never appears in ids, and `}` (0x7D) is the next byte up, so
/// `[{id}| .. {id}})` captures exactly this target's rows.
pub fn check_result_bounds(target_id: &str) -> (String, String) {
    (format!("{target_id}|"), format!("{target_id}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        rfc3339.parse().unwrap()
    }

    #[test]
    fn order_keys_sort_by_time_then_id() {
        let earlier = target_order_key(&at("2024-05-01T12:00:00Z"), "t_bb");
        let later = target_order_key(&at("2024-05-01T12:00:01Z"), "t_aa");
        assert!(earlier < later);

        let same_time_a = target_order_key(&at("2024-05-01T12:00:00Z"), "t_aa");
        let same_time_b = target_order_key(&at("2024-05-01T12:00:00Z"), "t_bb");
        assert!(same_time_a < same_time_b);
    }

    #[test]
    fn order_keys_preserve_subsecond_precision() {
        let coarse = target_order_key(&at("2024-05-01T12:00:00Z"), "t_aa");
        let fine = target_order_key(&at("2024-05-01T12:00:00.000000001Z"), "t_aa");
        assert!(coarse < fine);
    }

    #[test]
    fn host_keys_group_by_host_then_order() {
        let (start, end) = host_bounds("a.com");
        let own = host_order_key("a.com", &at("2024-05-01T12:00:00Z"), "t_x");
        assert!(start.as_str() <= own.as_str() && own.as_str() < end.as_str());

        // Hosts sharing a prefix stay outside the range.
        let other = host_order_key("a.company", &at("2024-05-01T12:00:00Z"), "t_x");
        assert!(!(start.as_str() <= other.as_str() && other.as_str() < end.as_str()));
    }

    #[test]
    fn result_bounds_cover_only_their_target() {
        let (start, end) = check_result_bounds("t_abc");
        let own = check_result_key("t_abc", &at("2024-05-01T12:00:00Z"), "cr_x");
        assert!(start.as_str() <= own.as_str() && own.as_str() < end.as_str());

        // A target id extending the prefix sorts outside the range.
        let other = check_result_key("t_abcd", &at("2024-05-01T12:00:00Z"), "cr_x");
        assert!(!(start.as_str() <= other.as_str() && other.as_str() < end.as_str()));
    }
}
