//! Per-host mutual exclusion for probes.

use std::collections::HashSet;
use std::sync::Mutex;

/// Ensures at most one probe runs against any given host at a time.
///
/// Host comparison is byte-exact; canonicalization normalizes case and
/// ports so equal hosts compare equal.
#[derive(Debug, Default)]
pub struct HostLimiter {
    hosts: Mutex<HashSet<String>>,
}

impl HostLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim a host. Returns false if a probe for it is in flight.
    pub fn acquire(&self, host: &str) -> bool {
        self.hosts.lock().unwrap().insert(host.to_string())
    }

    /// Release a host. Must be called exactly once per successful
    /// `acquire`.
    pub fn release(&self, host: &str) {
        self.hosts.lock().unwrap().remove(host);
    }
}
