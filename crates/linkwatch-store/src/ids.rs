//! Opaque id generation for stored entities.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

/// Prefix for target ids.
pub const TARGET_PREFIX: &str = "t_";

/// Prefix for check result ids.
pub const CHECK_RESULT_PREFIX: &str = "cr_";

/// Generate an id: the prefix plus 12 CSPRNG bytes, hex-encoded.
///
/// If the system RNG fails, falls back to a UTC timestamp id with
/// microsecond precision. The fallback keeps the process live; uniqueness
/// of targets is ultimately enforced by the canonical-URL constraint.
pub fn generate(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => format!("{prefix}{}", hex::encode(bytes)),
        Err(_) => format!("{prefix}{}", Utc::now().format("%Y%m%d%H%M%S%6f")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ids_have_prefix_and_hex_suffix() {
        let id = generate(TARGET_PREFIX);
        let suffix = id.strip_prefix("t_").unwrap();
        assert_eq!(suffix.len(), 24);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn check_result_ids_have_prefix() {
        assert!(generate(CHECK_RESULT_PREFIX).starts_with("cr_"));
    }

    #[test]
    fn ids_are_unique() {
        let a = generate(TARGET_PREFIX);
        let b = generate(TARGET_PREFIX);
        assert_ne!(a, b);
    }
}
