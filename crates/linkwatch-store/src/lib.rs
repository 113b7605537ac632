//! linkwatch-store — embedded durable store for Linkwatch.
//!
//! Backed by [redb](https://docs.rs/redb), persists targets, check results,
//! and idempotency keys. Domain types are JSON-serialized into redb's
//! `&[u8]` value columns; ordering indexes use zero-padded nanosecond keys
//! so lexicographic range scans match `(created_at, id)` tuple order.
//!
//! The `Store` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod ids;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::Store;
pub use types::*;
