//! Cursor token codec for target pagination.
//!
//! A token is base64-URL of `"<created_at RFC 3339, nanosecond precision>|<id>"`
//! and encodes the last row of a page as a strict lower bound for the next
//! one. Tokens are opaque to clients but must survive round-trips exactly.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};

/// Encode a `(created_at, id)` cursor as an opaque page token.
pub fn encode_page_token(created_at: &DateTime<Utc>, id: &str) -> String {
    let cursor = format!(
        "{}|{id}",
        created_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    );
    URL_SAFE.encode(cursor)
}

/// Decode a page token. Returns `None` for anything malformed; the caller
/// treats that as an absent cursor.
pub fn decode_page_token(token: &str) -> Option<(DateTime<Utc>, String)> {
    let decoded = URL_SAFE.decode(token).ok()?;
    let cursor = String::from_utf8(decoded).ok()?;
    let (time, id) = cursor.split_once('|')?;
    if id.is_empty() {
        return None;
    }
    let time = DateTime::parse_from_rfc3339(time).ok()?;
    Some((time.with_timezone(&Utc), id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_exactly() {
        let created_at: DateTime<Utc> = "2024-05-01T12:00:00.123456789Z".parse().unwrap();
        let token = encode_page_token(&created_at, "t_0123456789abcdef01234567");
        let (time, id) = decode_page_token(&token).unwrap();
        assert_eq!(time, created_at);
        assert_eq!(id, "t_0123456789abcdef01234567");
    }

    #[test]
    fn round_trips_whole_second_timestamps() {
        let created_at: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let token = encode_page_token(&created_at, "t_aa");
        assert_eq!(decode_page_token(&token), Some((created_at, "t_aa".to_string())));
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_page_token("not base64 !!!").is_none());
        // Valid base64 of a string without a separator.
        assert!(decode_page_token(&URL_SAFE.encode("no-separator")).is_none());
        // Separator but unparseable timestamp.
        assert!(decode_page_token(&URL_SAFE.encode("yesterday|t_aa")).is_none());
        // Missing id.
        assert!(decode_page_token(&URL_SAFE.encode("2024-05-01T12:00:00Z|")).is_none());
    }
}
