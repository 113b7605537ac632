//! REST API handlers.
//!
//! Each handler translates a request into store/canonicalizer calls and
//! maps the result onto the wire contract: validation failures are 400s
//! with a plain-text reason, unknown targets are 404s, and store failures
//! are logged and surfaced as a generic 500.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use linkwatch_store::{
    ids, CheckResult, CreateOutcome, ListCheckResultsParams, ListTargetsParams, Target,
};

use crate::pagination;
use crate::ApiState;

// ── Wire types ─────────────────────────────────────────────────────
// `canonical_url`, `host`, and `target_id` are internal; dedicated
// response structs keep them off the API surface.

#[derive(Serialize)]
pub struct TargetBody {
    pub id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Target> for TargetBody {
    fn from(target: Target) -> Self {
        TargetBody {
            id: target.id,
            url: target.url,
            created_at: target.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct CheckResultBody {
    pub id: String,
    pub checked_at: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl From<CheckResult> for CheckResultBody {
    fn from(result: CheckResult) -> Self {
        CheckResultBody {
            id: result.id,
            checked_at: result.checked_at,
            status_code: result.outcome.status_code(),
            latency_ms: result.latency_ms,
            error: result.outcome.error().map(str::to_string),
        }
    }
}

#[derive(Serialize)]
pub struct TargetPage {
    pub items: Vec<TargetBody>,
    pub next_page_token: String,
}

#[derive(Serialize)]
pub struct CheckResultPage {
    pub items: Vec<CheckResultBody>,
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

/// Parse a limit query value: absent or unparseable falls back to the
/// default, anything else is clamped to `[1, max]`.
fn parse_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
    match raw.and_then(|v| v.parse::<i64>().ok()) {
        Some(v) => v.clamp(1, max as i64) as usize,
        None => default,
    }
}

// ── POST /v1/targets ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTargetRequest {
    pub url: String,
}

pub async fn create_target(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<CreateTargetRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return (StatusCode::BAD_REQUEST, "invalid request body").into_response();
    };

    let canonical_url = match linkwatch_canon::canonicalize(&request.url) {
        Ok(canonical) => canonical,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let Some(host) = linkwatch_canon::host_of(&canonical_url) else {
        return (StatusCode::BAD_REQUEST, "url must have a host").into_response();
    };

    let target = Target {
        id: ids::generate(ids::TARGET_PREFIX),
        url: request.url,
        canonical_url,
        host,
        created_at: Utc::now(),
    };

    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty());

    match state.store.create_target(&target, idempotency_key) {
        Ok((stored, CreateOutcome::Created)) => {
            (StatusCode::CREATED, Json(TargetBody::from(stored))).into_response()
        }
        Ok((stored, CreateOutcome::Duplicate)) => {
            (StatusCode::OK, Json(TargetBody::from(stored))).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to create target");
            internal_error()
        }
    }
}

// ── GET /v1/targets ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ListTargetsQuery {
    pub limit: Option<String>,
    pub host: Option<String>,
    pub page_token: Option<String>,
}

pub async fn list_targets(
    State(state): State<ApiState>,
    Query(query): Query<ListTargetsQuery>,
) -> Response {
    let limit = parse_limit(query.limit.as_deref(), 50, 500);
    let host = query
        .host
        .as_deref()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty());
    let after = query
        .page_token
        .as_deref()
        .and_then(pagination::decode_page_token);

    let items = match state.store.list_targets(&ListTargetsParams { host, after, limit }) {
        Ok(items) => items,
        Err(err) => {
            error!(error = %err, "failed to list targets");
            return internal_error();
        }
    };

    // A full page means there may be more; the token points at its last row.
    let next_page_token = match items.last() {
        Some(last) if items.len() == limit => {
            pagination::encode_page_token(&last.created_at, &last.id)
        }
        _ => String::new(),
    };

    Json(TargetPage {
        items: items.into_iter().map(TargetBody::from).collect(),
        next_page_token,
    })
    .into_response()
}

// ── GET /v1/targets/{target_id}/results ────────────────────────────

#[derive(Deserialize, Default)]
pub struct ListResultsQuery {
    pub limit: Option<String>,
    pub since: Option<String>,
}

pub async fn list_check_results(
    State(state): State<ApiState>,
    Path(target_id): Path<String>,
    Query(query): Query<ListResultsQuery>,
) -> Response {
    match state.store.target_by_id(&target_id) {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "target not found").into_response(),
        Err(err) => {
            error!(error = %err, "failed to look up target");
            return internal_error();
        }
    }

    let limit = parse_limit(query.limit.as_deref(), 100, 1000);
    let since = query
        .since
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    match state.store.list_check_results(&ListCheckResultsParams {
        target_id,
        since,
        limit,
    }) {
        Ok(items) => Json(CheckResultPage {
            items: items.into_iter().map(CheckResultBody::from).collect(),
        })
        .into_response(),
        Err(err) => {
            error!(error = %err, "failed to list check results");
            internal_error()
        }
    }
}

// ── GET /healthz ───────────────────────────────────────────────────

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
