//! `tracing` subscriber setup for the CLI and embedding hosts.

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::AppError;

pub const DEFAULT_FILTER: &str = "info";

/// Pick the filter directive: `RUST_LOG` first, then the configured one,
/// then [`DEFAULT_FILTER`]. Invalid directives fall through to the next source.
pub fn resolve_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| configured.map_or_else(|| EnvFilter::try_new(DEFAULT_FILTER), EnvFilter::try_new))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to stderr so `--json` output on
/// stdout stays machine-readable. Fails if a subscriber is already installed.
pub fn init_logging(configured: Option<&str>) -> Result<(), AppError> {
    fmt()
        .with_env_filter(resolve_filter(configured))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Settings {
            message: format!("Failed to initialise logging: {e}"),
        })?;
    debug!("Logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // First call may race with other tests; only the second must fail.
        let _ = init_logging(Some("debug"));
        assert!(init_logging(None).is_err());
    }

    #[test]
    fn test_bad_directive_falls_back() {
        if std::env::var_os("RUST_LOG").is_none() {
            let filter = resolve_filter(Some("command_hub=loud"));
            assert_eq!(filter.to_string(), DEFAULT_FILTER);
        }
    }
}
