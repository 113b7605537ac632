//! Environment-driven configuration.
//!
//! Every setting has a default; invalid values fall back to it rather than
//! failing startup.

use std::time::Duration;

/// Application settings.
///
/// | Variable | Meaning | Default |
/// |---|---|---|
/// | `HTTP_PORT` | API listen port | `8080` |
/// | `DATABASE_URL` | Store file path | `linkwatch.db` |
/// | `CHECK_INTERVAL` | Time between scheduler ticks | `15s` |
/// | `MAX_CONCURRENCY` | Probe worker count | `8` |
/// | `HTTP_TIMEOUT` | Per-attempt probe deadline | `5s` |
/// | `SHUTDOWN_GRACE` | Cap on graceful shutdown | `10s` |
/// | `INSECURE_SKIP_VERIFY` | Disable TLS verification on probes | `false` |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    pub check_interval: Duration,
    pub max_concurrency: usize,
    pub http_timeout: Duration,
    pub shutdown_grace: Duration,
    pub insecure_skip_verify: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::load(|key| std::env::var(key).ok())
    }

    fn load(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            http_port: get("HTTP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_url: get("DATABASE_URL").unwrap_or_else(|| "linkwatch.db".to_string()),
            check_interval: get("CHECK_INTERVAL")
                .as_deref()
                .and_then(parse_duration)
                .filter(|d| !d.is_zero())
                .unwrap_or(Duration::from_secs(15)),
            max_concurrency: get("MAX_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(8),
            http_timeout: get("HTTP_TIMEOUT")
                .as_deref()
                .and_then(parse_duration)
                .filter(|d| !d.is_zero())
                .unwrap_or(Duration::from_secs(5)),
            shutdown_grace: get("SHUTDOWN_GRACE")
                .as_deref()
                .and_then(parse_duration)
                .unwrap_or(Duration::from_secs(10)),
            insecure_skip_verify: get("INSECURE_SKIP_VERIFY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Parse a duration string like "15s", "500ms", "2m", or bare seconds.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::load(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_with(&[]);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_url, "linkwatch.db");
        assert_eq!(config.check_interval, Duration::from_secs(15));
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
        assert!(!config.insecure_skip_verify);
    }

    #[test]
    fn overrides_from_environment() {
        let config = config_with(&[
            ("HTTP_PORT", "9090"),
            ("DATABASE_URL", "/tmp/test.db"),
            ("CHECK_INTERVAL", "30s"),
            ("MAX_CONCURRENCY", "4"),
            ("HTTP_TIMEOUT", "500ms"),
            ("SHUTDOWN_GRACE", "1m"),
            ("INSECURE_SKIP_VERIFY", "true"),
        ]);
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.database_url, "/tmp/test.db");
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.http_timeout, Duration::from_millis(500));
        assert_eq!(config.shutdown_grace, Duration::from_secs(60));
        assert!(config.insecure_skip_verify);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_with(&[
            ("HTTP_PORT", "not-a-port"),
            ("CHECK_INTERVAL", "soon"),
            ("MAX_CONCURRENCY", "0"),
        ]);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.check_interval, Duration::from_secs(15));
        assert_eq!(config.max_concurrency, 8);
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(parse_duration("15s"), Some(Duration::from_secs(15)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration(" 5s "), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration(""), None);
    }
}
