use tracing_subscriber::EnvFilter;

use crate::util::env::env_opt;

/// Filter used when `RUST_LOG` is unset: our spans at info, sqlx statement logs muted.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Output layout of the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Target, file and line on every event; the server default.
    Full,
    /// One short line per event, no target; the CLI default.
    Compact,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" => Some(Self::Full),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    /// `LOG_FORMAT` when set to a known layout, otherwise `default`.
    pub fn from_env(default: Self) -> Self {
        env_opt("LOG_FORMAT")
            .and_then(|raw| Self::parse(&raw))
            .unwrap_or(default)
    }
}

/// Installs the global subscriber. `default_filter` applies when `RUST_LOG` is unset.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match format {
        LogFormat::Full => builder
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Compact => builder.with_target(false).compact().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("tracing subscriber already set: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_names() {
        assert_eq!(LogFormat::parse("full"), Some(LogFormat::Full));
        assert_eq!(LogFormat::parse(" Compact "), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("json"), None);
    }
}
