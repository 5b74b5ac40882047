//! Environment helpers: dotenv loading plus typed getters.
//! Call `init_env()` early in each binary (the getters also call it lazily).
use std::str::FromStr;
use std::sync::Once;
use tracing::warn;

static INIT: Once = Once::new();

/// Load `.env` once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Optional env var (None if unset or blank).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Env var or a default.
pub fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Parsed value with default fallback; an unparsable value is logged and ignored.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env_opt(key) {
        Some(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(target = "env", key, value = %raw, "unparsable value; using default");
                default
            }
        },
        None => default,
    }
}

/// Strict variant of [`env_parse`]: an unparsable value is an error.
pub fn env_parse_req<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Comma-separated list; blanks dropped.
pub fn env_list(key: &str, default: &str) -> Vec<String> {
    env_or(key, default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
