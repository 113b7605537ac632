//! linkwatch-api — REST API for Linkwatch.
//!
//! Provides axum route handlers that translate HTTP requests into store and
//! canonicalizer calls.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/v1/targets` | Register a URL (idempotent via `Idempotency-Key`) |
//! | GET | `/v1/targets` | List targets with cursor pagination |
//! | GET | `/v1/targets/{target_id}/results` | List a target's check history |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;
pub mod pagination;

use axum::routing::{get, post};
use axum::Router;
use linkwatch_store::Store;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
}

/// Build the complete API router.
pub fn build_router(store: Store) -> Router {
    let state = ApiState { store };
    Router::new()
        .route(
            "/v1/targets",
            post(handlers::create_target).get(handlers::list_targets),
        )
        .route(
            "/v1/targets/{target_id}/results",
            get(handlers::list_check_results),
        )
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
