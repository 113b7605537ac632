//! URL canonicalization for Linkwatch.
//!
//! Every registered URL is reduced to a canonical form that serves as the
//! deduplication key and as the URL actually probed. Canonicalization is
//! pure and deterministic: identical inputs always yield identical outputs,
//! and canonicalizing an already-canonical URL is a no-op.

use thiserror::Error;
use url::Url;

/// Errors produced when a raw URL cannot be canonicalized.
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    #[error("failed to parse url: {0}")]
    Parse(#[from] url::ParseError),

    #[error("url must be an absolute http or https url")]
    UnsupportedScheme,
}

/// Canonicalize a raw URL string.
///
/// Rules, in order:
/// 1. Parse as an absolute URL (relative references fail to parse).
/// 2. Reject any scheme other than `http` or `https`.
/// 3. Lowercase the scheme and host.
/// 4. Strip default ports (`:80` for http, `:443` for https); custom ports
///    are preserved.
/// 5. Drop the fragment.
/// 6. Strip a single trailing `/` from the path, unless the path is `/`.
/// 7. Preserve the query string as parsed.
///
/// Parsing already lowercases the scheme and host and drops default ports,
/// so only the fragment and trailing-slash rules are applied explicitly.
pub fn canonicalize(raw: &str) -> Result<String, CanonicalizeError> {
    let mut url = Url::parse(raw)?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(CanonicalizeError::UnsupportedScheme),
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    Ok(url.to_string())
}

/// The lowercased host of a canonical URL, without any port.
///
/// Returns `None` for URLs without a host component; canonical URLs always
/// have one.
pub fn host_of(canonical_url: &str) -> Option<String> {
    let url = Url::parse(canonical_url).ok()?;
    url.host_str().map(|h| h.to_string())
}
